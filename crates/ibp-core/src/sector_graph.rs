//! Non-trivial sector ordering and super-/sub-sector linkage.

/// One non-trivial sector: its mask and links to its immediate
/// super-/sub-sectors (restricted, for sub-sectors, to other non-trivial
/// sectors).
#[derive(Clone, Debug)]
pub struct Sector {
    pub id: u64,
    pub super_sectors: Vec<u64>,
    pub sub_sectors: Vec<u64>,
}

pub struct SectorGraph {
    sectors: Vec<Sector>,
}

impl SectorGraph {
    /// `top`: the union-of-targets top sector mask. `n`: propagator count
    /// (`lines[0..n)` is `top`'s bit-set). `non_trivial[mask]` as returned
    /// by `TrivialSectorOracle::find_non_trivial`.
    pub fn build(top: u64, n: usize, non_trivial: &[bool]) -> SectorGraph {
        let mut masks = Vec::new();
        let mut sub = top;
        loop {
            if non_trivial.get(sub as usize).copied().unwrap_or(false) {
                masks.push(sub);
            }
            if sub == 0 {
                break;
            }
            sub = (sub - 1) & top;
        }

        masks.sort_by(|a, b| b.count_ones().cmp(&a.count_ones()).then(b.cmp(a)));

        let mut sectors = Vec::with_capacity(masks.len());
        for &id in &masks {
            let mut super_sectors = Vec::new();
            let mut sub_sectors = Vec::new();
            for b in 0..n {
                let bit = 1u64 << b;
                if top & bit != 0 && id & bit == 0 {
                    super_sectors.push(id | bit);
                }
            }
            for b in 0..n {
                let bit = 1u64 << b;
                if id & bit != 0 {
                    let candidate = id ^ bit;
                    if non_trivial.get(candidate as usize).copied().unwrap_or(false) {
                        sub_sectors.push(candidate);
                    }
                }
            }
            sectors.push(Sector {
                id,
                super_sectors,
                sub_sectors,
            });
        }

        SectorGraph { sectors }
    }

    /// Non-trivial sectors, ordered by decreasing popcount then decreasing
    /// mask (the order `Driver` reduces them in).
    pub fn sectors(&self) -> &[Sector] {
        &self.sectors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orders_by_popcount_then_mask_descending() {
        // top = 0b111, sectors 0b111, 0b110, 0b101, 0b011 all non-trivial.
        let mut non_trivial = vec![false; 8];
        for m in [0b111, 0b110, 0b101, 0b011] {
            non_trivial[m] = true;
        }
        let graph = SectorGraph::build(0b111, 3, &non_trivial);
        let ids: Vec<u64> = graph.sectors().iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![0b111, 0b110, 0b101, 0b011]);
    }

    #[test]
    fn super_and_sub_sectors_restricted_to_top_and_non_trivial() {
        let mut non_trivial = vec![false; 4];
        non_trivial[0b11] = true;
        non_trivial[0b01] = true;
        // 0b10 deliberately left trivial/absent.
        let graph = SectorGraph::build(0b11, 2, &non_trivial);
        let sub_sector = graph.sectors().iter().find(|s| s.id == 0b11).unwrap();
        assert_eq!(sub_sector.sub_sectors, vec![0b01]);
        assert!(sub_sector.super_sectors.is_empty());
    }
}
