//! Topology algebraic preparation: scalar-product linearization, the
//! Symanzik `U`/`F` polynomials, and the IBP relation templates.
//!
//! Every invariant and the dimension `D` are sampled to `ModP` once, up
//! front, so everything downstream of `from_config` is ordinary
//! `Poly`/`ModP` bookkeeping rather than a general symbolic pipeline.

use crate::algebra::expr_parser::{parse, Expr};
use crate::algebra::matrix::{poly_adjugate, poly_det, Matrix};
use crate::algebra::poly::{Monomial, Poly};
use crate::algebra::sample::sample_nonzero;
use crate::config::RawFamilyConfig;
use crate::error::IbpError;
use crate::ibp_template::{IbpTemplateFF, TemplateCoeffs};
use crate::integral::Integral;
use crate::modp::ModP;
use crate::symbol::{SymbolId, SymbolRegistry};
use rustc_hash::FxHashMap;

/// A topology: its momenta/invariants/propagators, once interned and
/// sampled, plus (after `prepare`) its IBP templates and Symanzik data.
pub struct Family {
    pub name: String,
    pub l: usize,
    pub e: usize,
    pub n: usize,
    #[allow(dead_code)]
    symbols: SymbolRegistry,
    internal_syms: Vec<SymbolId>,
    external_syms: Vec<SymbolId>,
    index_syms: Vec<SymbolId>,
    prop_syms: Vec<SymbolId>,
    k_syms: Vec<SymbolId>,
    pub dimension: ModP,
    prop_polys: Vec<Poly>,
    sp_rule_table: FxHashMap<(SymbolId, SymbolId), ModP>,
    sps_from_props: FxHashMap<Monomial, Poly>,
    pub u_poly: Poly,
    pub f_poly: Poly,
    /// `H = Σ k_i a_i dG/da_i - G`, `G = U + F`. Precomputed once; consumed
    /// by `TrivialSectorOracle` once per candidate sector mask.
    pub g_diff: Poly,
    pub templates: Vec<IbpTemplateFF>,
}

impl Family {
    pub fn index_syms(&self) -> &[SymbolId] {
        &self.index_syms
    }

    pub fn k_syms(&self) -> &[SymbolId] {
        &self.k_syms
    }

    /// Parse, validate and intern a family config; builds propagator
    /// polynomials but does not yet derive `sps_from_props`, `U`/`F` or the
    /// IBP templates -- call `prepare()` for that.
    pub fn from_config(cfg: &RawFamilyConfig) -> Result<Family, IbpError> {
        let l = cfg.internals.len();
        let e = cfg.externals.len();
        let n = l * e + l * (l + 1) / 2;
        let nsps = e * (e + 1) / 2;

        if cfg.propagators.len() != n {
            return Err(IbpError::ConfigError(format!(
                "family {:?}: expected {n} propagators (L*E + L(L+1)/2), found {}",
                cfg.name,
                cfg.propagators.len()
            )));
        }
        if cfg.sp_rules.len() != nsps {
            return Err(IbpError::ConfigError(format!(
                "family {:?}: expected {nsps} sp_rules (E(E+1)/2), found {}",
                cfg.name,
                cfg.sp_rules.len()
            )));
        }

        let mut seen = std::collections::HashSet::new();
        for name in cfg
            .internals
            .iter()
            .chain(cfg.externals.iter())
            .chain(cfg.invariants.iter().map(|(name, _)| name))
        {
            if !seen.insert(name.clone()) {
                return Err(IbpError::ConfigError(format!(
                    "symbol {name:?} defined more than once"
                )));
            }
        }

        let mut symbols = SymbolRegistry::new();
        let mut momentum_by_name: FxHashMap<String, SymbolId> = FxHashMap::default();
        let internal_syms: Vec<SymbolId> = cfg
            .internals
            .iter()
            .map(|name| {
                let id = symbols.intern(name);
                momentum_by_name.insert(name.clone(), id);
                id
            })
            .collect();
        let external_syms: Vec<SymbolId> = cfg
            .externals
            .iter()
            .map(|name| {
                let id = symbols.intern(name);
                momentum_by_name.insert(name.clone(), id);
                id
            })
            .collect();

        if let Some(invar_one) = &cfg.invar_one {
            if !cfg.invariants.iter().any(|(name, _)| name == invar_one) {
                return Err(IbpError::ConfigError(format!(
                    "invar_one {invar_one:?} is not among family.invariants"
                )));
            }
        }

        let mut invariant_value: FxHashMap<String, ModP> = FxHashMap::default();
        for (name, _mass_dim) in &cfg.invariants {
            let value = if cfg.invar_one.as_deref() == Some(name.as_str()) {
                ModP::one()
            } else {
                sample_nonzero(&cfg.name, name)
            };
            invariant_value.insert(name.clone(), value);
        }

        let dimension = match &cfg.dimension {
            None => sample_nonzero(&cfg.name, "D"),
            Some(text) => match parse(text)? {
                Expr::Integer(v) => ModP::from_i64(v),
                _ => sample_nonzero(&cfg.name, "D"),
            },
        };

        let external_set: std::collections::HashSet<SymbolId> =
            external_syms.iter().copied().collect();
        let is_external = |s: SymbolId| external_set.contains(&s);

        let mut sp_rule_table: FxHashMap<(SymbolId, SymbolId), ModP> = FxHashMap::default();
        for (a, b, value_expr) in &cfg.sp_rules {
            let a_sym = *momentum_by_name.get(a).ok_or_else(|| {
                IbpError::ConfigError(format!("sp_rules refers to unknown symbol {a:?}"))
            })?;
            let b_sym = *momentum_by_name.get(b).ok_or_else(|| {
                IbpError::ConfigError(format!("sp_rules refers to unknown symbol {b:?}"))
            })?;
            if !is_external(a_sym) || !is_external(b_sym) {
                return Err(IbpError::ConfigError(format!(
                    "sp_rules entry ({a}, {b}, ..) must relate two external momenta"
                )));
            }
            let value = parse(value_expr)?.eval_as_modp(&|name| invariant_value.get(name).copied())?;
            let key = if a_sym <= b_sym { (a_sym, b_sym) } else { (b_sym, a_sym) };
            sp_rule_table.insert(key, value);
        }

        let mut prop_polys = Vec::with_capacity(n);
        for (momentum_expr, mass_expr) in &cfg.propagators {
            let momentum_poly =
                parse(momentum_expr)?.eval_as_poly(&|name| momentum_by_name.get(name).copied())?;
            let mass_value =
                parse(mass_expr)?.eval_as_modp(&|name| invariant_value.get(name).copied())?;
            let mut d = momentum_poly.mul(&momentum_poly);
            d = d.sub(&Poly::constant(mass_value * mass_value));
            d = d.substitute_external_pairs(is_external, &sp_rule_table);
            prop_polys.push(d);
        }

        let mut index_syms = Vec::with_capacity(n);
        let mut prop_syms = Vec::with_capacity(n);
        let mut k_syms = Vec::with_capacity(n);
        for s in 0..n {
            index_syms.push(symbols.intern(&format!("a{}", s + 1)));
            prop_syms.push(symbols.intern(&format!("D{}", s + 1)));
            k_syms.push(symbols.intern(&format!("k{}", s + 1)));
        }

        Ok(Family {
            name: cfg.name.clone(),
            l,
            e,
            n,
            symbols,
            internal_syms,
            external_syms,
            index_syms,
            prop_syms,
            k_syms,
            dimension,
            prop_polys,
            sp_rule_table,
            sps_from_props: FxHashMap::default(),
            u_poly: Poly::zero(),
            f_poly: Poly::zero(),
            g_diff: Poly::zero(),
            templates: Vec::new(),
        })
    }

    fn is_external(&self, s: SymbolId) -> bool {
        self.external_syms.contains(&s)
    }

    fn is_momentum(&self, s: SymbolId) -> bool {
        self.internal_syms.contains(&s) || self.external_syms.contains(&s)
    }

    /// `_compute_sps` -- `x_j` basis of scalar-product monomials, in the
    /// same order the `M` linearisation matrix's columns use.
    fn x_basis(&self) -> Vec<Monomial> {
        let mut basis = Vec::with_capacity(self.n);
        for i in 0..self.l {
            for j in i..self.l {
                basis.push(Monomial::from_symbols(&[
                    self.internal_syms[i],
                    self.internal_syms[j],
                ]));
            }
        }
        for i in 0..self.l {
            for j in 0..self.e {
                basis.push(Monomial::from_symbols(&[
                    self.internal_syms[i],
                    self.external_syms[j],
                ]));
            }
        }
        basis
    }

    /// `Family::init()`: `_compute_sps`, `_compute_symanzik`,
    /// `_generate_ibp`, in that order.
    pub fn prepare(&mut self) -> Result<(), IbpError> {
        self.compute_sps()?;
        self.compute_symanzik();
        self.generate_ibp();
        self.compute_g_diff();
        Ok(())
    }

    fn compute_sps(&mut self) -> Result<(), IbpError> {
        let basis = self.x_basis();
        let mut m = Matrix::zeros(self.n, self.n);
        let mut const_vec = vec![ModP::zero(); self.n];
        for s in 0..self.n {
            const_vec[s] = self.prop_polys[s].constant_term();
            for (col, mono) in basis.iter().enumerate() {
                m.set(s, col, self.prop_polys[s].coefficient(mono));
            }
        }
        let inv = m.inverse()?;

        let mut table = FxHashMap::default();
        for (col, mono) in basis.iter().enumerate() {
            let mut expr = Poly::zero();
            for s in 0..self.n {
                let coeff = inv.get(col, s);
                if coeff.is_zero() {
                    continue;
                }
                expr = expr.add(&Poly::symbol(self.prop_syms[s]).scale(coeff));
                expr = expr.sub(&Poly::constant(const_vec[s] * coeff));
            }
            table.insert(mono.clone(), expr);
        }
        self.sps_from_props = table;
        Ok(())
    }

    /// `_compute_symanzik`: builds the `L x L` matrix `M` and vector `V`
    /// of the Schwinger-parametrised propagator sum, then `U = det(M)` and
    /// `F = U*J + V^T*adj(M)*V` via the adjugate identity (avoiding a
    /// division by `U` in the polynomial ring).
    fn compute_symanzik(&mut self) {
        let mut schwinger = Poly::zero();
        for s in 0..self.n {
            let term = Poly::symbol(self.index_syms[s]).neg().mul(&self.prop_polys[s]);
            schwinger = schwinger.add(&term);
        }

        let mut j_poly = schwinger.clone();
        for &li in &self.internal_syms {
            j_poly = j_poly.eval_symbol(li, ModP::zero());
        }
        j_poly = j_poly.neg();

        let half = ModP::from_i64(2).inverse().expect("2 is invertible mod p");

        let d: Vec<Poly> = self.internal_syms.iter().map(|&li| schwinger.diff(li)).collect();

        let mut m_mat = vec![vec![Poly::zero(); self.l]; self.l];
        for i in 0..self.l {
            for j in i..self.l {
                let mut entry = d[i].diff(self.internal_syms[j]);
                if i == j {
                    entry = entry.scale(half);
                }
                m_mat[i][j] = entry.clone();
                if i != j {
                    m_mat[j][i] = entry;
                }
            }
        }

        let mut v_vec = Vec::with_capacity(self.l);
        for i in 0..self.l {
            let mut di0 = d[i].clone();
            for &li in &self.internal_syms {
                di0 = di0.eval_symbol(li, ModP::zero());
            }
            v_vec.push(di0.neg().scale(half));
        }

        let u_poly = poly_det(&m_mat);
        let adj = poly_adjugate(&m_mat);

        let mut vadjv = Poly::zero();
        for i in 0..self.l {
            for j in 0..self.l {
                vadjv = vadjv.add(&v_vec[i].mul(&adj[i][j]).mul(&v_vec[j]));
            }
        }
        let mut f_poly = u_poly.mul(&j_poly).add(&vadjv);
        f_poly = f_poly.substitute_external_pairs(|s| self.is_external(s), &self.sp_rule_table);

        self.u_poly = u_poly;
        self.f_poly = f_poly;
    }

    /// `_generate_ibp`: one `IbpTemplateFF` per `(i, j)` with `i` an
    /// internal-momentum index and `j` ranging over all momenta (internal
    /// then external), applying `d/dl_i (v_j * sum_s -a_s D_s) = D * delta_ij`
    /// and rewriting the resulting scalar products back through
    /// `sps_from_props` one propagator symbol at a time.
    fn generate_ibp(&mut self) {
        let mut templates = Vec::with_capacity(self.l * (self.l + self.e));
        for i in 0..self.l {
            for j in 0..(self.l + self.e) {
                let v_j_poly = if j < self.l {
                    Poly::symbol(self.internal_syms[j])
                } else {
                    Poly::symbol(self.external_syms[j - self.l])
                };

                let mut equation: FxHashMap<Integral, Poly> = FxHashMap::default();
                if i == j {
                    accumulate(
                        &mut equation,
                        Integral::zeros(self.n),
                        Poly::constant(self.dimension),
                    );
                }

                for s in 0..self.n {
                    let mut coeff = Poly::symbol(self.index_syms[s])
                        .neg()
                        .mul(&v_j_poly)
                        .mul(&self.prop_polys[s].diff(self.internal_syms[i]));
                    coeff = coeff.substitute_external_pairs(
                        |sym| self.is_external(sym),
                        &self.sp_rule_table,
                    );
                    if coeff.is_zero() {
                        continue;
                    }
                    coeff =
                        coeff.substitute_factor(|sym| self.is_momentum(sym), &self.sps_from_props);

                    let mut idx = vec![0i32; self.n];
                    idx[s] = 1;
                    for t in 0..self.n {
                        let coeff_d = coeff.diff(self.prop_syms[t]);
                        if !coeff_d.is_zero() {
                            idx[t] -= 1;
                            accumulate(&mut equation, Integral::from_slice(&idx), coeff_d);
                            idx[t] += 1;
                        }
                        coeff = coeff.eval_symbol(self.prop_syms[t], ModP::zero());
                        if coeff.is_zero() {
                            break;
                        }
                    }
                    if !coeff.is_zero() {
                        accumulate(&mut equation, Integral::from_slice(&idx), coeff);
                    }
                }

                let mut pairs: Vec<(Integral, Poly)> =
                    equation.into_iter().filter(|(_, p)| !p.is_zero()).collect();
                pairs.sort_by(|a, b| b.0.cmp(&a.0));

                let mut terms = Vec::with_capacity(pairs.len());
                for (delta, poly) in pairs {
                    let (c0, ct) = poly.extract_linear(&self.index_syms);
                    let per_index: Vec<ModP> = ct.iter().map(|p| p.constant_term()).collect();
                    let coeffs = TemplateCoeffs::new(c0.constant_term(), per_index);
                    if !coeffs.is_zero_everywhere() {
                        terms.push((delta, coeffs));
                    }
                }
                templates.push(IbpTemplateFF::new(terms));
            }
        }
        self.templates = templates;
    }

    /// `H = Σ_i k_i a_i dG/da_i - G`, `G = U + F`, used by
    /// `TrivialSectorOracle::is_trivial` to build its `k`-equation system.
    fn compute_g_diff(&mut self) {
        let g = self.u_poly.add(&self.f_poly);
        let mut h = g.neg();
        for (idx, &a_sym) in self.index_syms.iter().enumerate() {
            let dg = g.diff(a_sym);
            let term = Poly::symbol(self.k_syms[idx]).mul(&Poly::symbol(a_sym)).mul(&dg);
            h = h.add(&term);
        }
        self.g_diff = h;
    }
}

fn accumulate(map: &mut FxHashMap<Integral, Poly>, key: Integral, value: Poly) {
    match map.get_mut(&key) {
        Some(existing) => *existing = existing.add(&value),
        None => {
            map.insert(key, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RawConfig;

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

    #[test]
    fn prepares_bubble_without_error() {
        let cfg = RawConfig::load_from_toml(BUBBLE).unwrap();
        let mut family = Family::from_config(&cfg.family).unwrap();
        family.prepare().unwrap();
        assert_eq!(family.n, 2);
        assert_eq!(family.templates.len(), family.l * (family.l + family.e));
        assert!(!family.u_poly.is_zero());
    }

    #[test]
    fn rejects_duplicate_symbol_names() {
        let bad = BUBBLE.replace(r#"internals = ["k1"]"#, r#"internals = ["p1"]"#);
        let cfg = RawConfig::load_from_toml(&bad).unwrap();
        assert!(Family::from_config(&cfg.family).is_err());
    }

    #[test]
    fn rejects_wrong_propagator_count() {
        let bad = BUBBLE.replace(
            r#"propagators = [["k1", "m"], ["k1+p1", "m"]]"#,
            r#"propagators = [["k1", "m"]]"#,
        );
        let cfg = RawConfig::load_from_toml(&bad).unwrap();
        assert!(Family::from_config(&cfg.family).is_err());
    }
}
