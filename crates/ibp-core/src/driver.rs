//! Glues config -> `Family` preparation -> per-sector reduction -> result
//! files.

use std::collections::HashSet;
use std::io::Write;
use std::path::Path;

use crate::config::RawConfig;
use crate::error::IbpError;
use crate::family::Family;
use crate::integral::Integral;
use crate::modp::ModP;
use crate::reduction_kernel::reduce_sector;
use crate::sector_graph::SectorGraph;
use crate::seed_generator::generate_seeds;
use crate::trivial_sector::TrivialSectorOracle;

/// One in-budget seed's reduction, as a linear combination of masters.
/// A master's own line is the trivial one-term combination `1 * itself`
/// (see `write_results` for why this shape was chosen over omitting
/// masters entirely).
pub struct ReductionLine {
    pub seed: Integral,
    pub combination: Vec<(ModP, Integral)>,
}

/// One reduced sector, ready to be rendered as a `result_<sectorId>` file.
pub struct SectorResult {
    pub sector_id: u64,
    pub masters: Vec<Integral>,
    pub lines: Vec<ReductionLine>,
}

/// The full outcome of reducing every non-trivial sector for one config.
pub struct RunOutput {
    pub family_name: String,
    pub sectors: Vec<SectorResult>,
}

/// Read `config_path`, prepare the family it describes, and reduce every
/// non-trivial sector under the resolved `top`/`depth_max`/`rank_max`
/// reduction job. Does not touch the filesystem beyond reading the config
/// (see `write_results` for the output side), so tests and `ibp-cli` can
/// both drive it directly.
pub fn run(config_path: &Path) -> Result<RunOutput, IbpError> {
    let raw = RawConfig::load_from_file(config_path)?;

    println!("\n#0.0  Parsing config file finished.");

    let mut family = Family::from_config(&raw.family)?;

    println!("\n#0.1  Initializing integral family...");
    family.prepare()?;
    println!("\n#0.1  Initializing integral family finished.");

    let job = raw.reduce.resolve(family.n)?;

    println!("\n#0.2  Searching trivial sectors...");
    let non_trivial = TrivialSectorOracle::find_non_trivial(&family, job.top);
    let graph = SectorGraph::build(job.top, family.n, &non_trivial);
    println!(
        "\n#0.2  Searching trivial sectors finished. {} non-trivial sector(s).",
        graph.sectors().len()
    );

    let mut sectors = Vec::with_capacity(graph.sectors().len());
    println!("\n#0.3  Reducing sectors...");
    for sector in graph.sectors() {
        let catalogue = generate_seeds(sector.id, family.n, job.depth_max, job.rank_max);
        let result = reduce_sector(&catalogue, &family.templates, job.depth_max, job.rank_max)?;

        let master_set: HashSet<&Integral> = result.masters.iter().collect();
        let mut lines = Vec::with_capacity(catalogue.len());
        for seed in catalogue.seeds() {
            if seed.depth() >= job.depth_max || seed.rank() >= job.rank_max {
                continue;
            }
            if master_set.contains(seed) {
                lines.push(ReductionLine {
                    seed: seed.clone(),
                    combination: vec![(ModP::one(), seed.clone())],
                });
            } else if let Some(combo) = result.reductions.get(seed) {
                lines.push(ReductionLine {
                    seed: seed.clone(),
                    combination: combo.iter().map(|(target, coeff)| (*coeff, target.clone())).collect(),
                });
            }
        }

        sectors.push(SectorResult {
            sector_id: sector.id,
            masters: result.masters,
            lines,
        });
    }
    println!("\n#0.3  Reducing sectors finished.");

    Ok(RunOutput {
        family_name: family.name.clone(),
        sectors,
    })
}

/// Render every sector's result to `dir/result_<sectorId>` (`sectorId`
/// rendered in decimal, matching `ModP`'s own decimal convention): one
/// `<seed>` / `<combination>` pair per in-budget seed, master or not, with
/// a master's own combination being the trivial `1 * <itself>` term. This
/// keeps the file self-describing -- every cataloged seed, not only the
/// non-master ones, has an entry -- without a second file format for the
/// basis list (see `DESIGN.md`).
pub fn write_results(dir: &Path, output: &RunOutput) -> Result<(), IbpError> {
    for sector in &output.sectors {
        let path = dir.join(format!("result_{}", sector.sector_id));
        let mut text = String::new();
        for line in &sector.lines {
            text.push_str(&line.seed.to_string());
            text.push('\n');
            if line.combination.is_empty() {
                text.push('0');
            } else {
                let rendered: Vec<String> = line
                    .combination
                    .iter()
                    .map(|(coeff, target)| format!("{coeff} * {target}"))
                    .collect();
                text.push_str(&rendered.join(" + "));
            }
            text.push('\n');
        }
        let mut file = std::fs::File::create(&path)
            .map_err(|e| IbpError::ConfigError(format!("cannot write {}: {e}", path.display())))?;
        file.write_all(text.as_bytes())
            .map_err(|e| IbpError::ConfigError(format!("cannot write {}: {e}", path.display())))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const BUBBLE: &str = r#"
        [family]
        name = "bubble"
        dimension = "D"
        internals = ["k1"]
        externals = ["p1"]
        invariants = [["s", 1], ["m", 1]]
        invar_one = "m"
        sp_rules = [["p1", "p1", "s"]]
        propagators = [["k1", "m"], ["k1+p1", "m"]]

        [reduce]
        targets = [[1, 1]]
    "#;

    fn write_temp_config(text: &str) -> tempfile_path::TempConfig {
        tempfile_path::TempConfig::new(text)
    }

    /// Tiny ad-hoc temp-file helper so this crate does not reach for a
    /// `tempfile` dependency just for this one test module.
    mod tempfile_path {
        use std::path::PathBuf;

        pub struct TempConfig {
            pub path: PathBuf,
        }

        impl TempConfig {
            pub fn new(text: &str) -> Self {
                let mut path = std::env::temp_dir();
                path.push(format!("ibp-core-test-{:x}.toml", std::process::id() as u64 ^ text.len() as u64));
                std::fs::write(&path, text).unwrap();
                TempConfig { path }
            }
        }

        impl Drop for TempConfig {
            fn drop(&mut self) {
                let _ = std::fs::remove_file(&self.path);
            }
        }
    }

    #[test]
    fn bubble_end_to_end_has_one_master() {
        let cfg = write_temp_config(BUBBLE);
        let output = run(&cfg.path).unwrap();
        assert_eq!(output.sectors.len(), 1);
        assert_eq!(output.sectors[0].sector_id, 0b11);
        assert_eq!(output.sectors[0].masters.len(), 1);
        assert_eq!(output.sectors[0].masters[0].as_slice(), [1, 1]);
    }

    #[test]
    fn write_results_is_deterministic_across_runs() {
        let cfg = write_temp_config(BUBBLE);
        let out1 = run(&cfg.path).unwrap();
        let out2 = run(&cfg.path).unwrap();

        let dir1 = std::env::temp_dir().join(format!("ibp-core-out1-{}", std::process::id()));
        let dir2 = std::env::temp_dir().join(format!("ibp-core-out2-{}", std::process::id()));
        std::fs::create_dir_all(&dir1).unwrap();
        std::fs::create_dir_all(&dir2).unwrap();
        write_results(&dir1, &out1).unwrap();
        write_results(&dir2, &out2).unwrap();

        let bytes1 = std::fs::read(dir1.join("result_3")).unwrap();
        let bytes2 = std::fs::read(dir2.join("result_3")).unwrap();
        assert_eq!(bytes1, bytes2);

        let _ = std::fs::remove_dir_all(&dir1);
        let _ = std::fs::remove_dir_all(&dir2);
    }
}
