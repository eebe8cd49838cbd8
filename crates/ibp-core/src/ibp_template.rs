//! `IbpTemplateFF`: the finite-field specialisation of an IBP relation
//! template, as produced by `Family::prepare` and consumed by
//! `ReductionKernel`.
//!
//! A template coefficient is always affine in the index variables `aᵢ`
//! (each propagator symbol is differentiated exactly once before the
//! remainder is constant), so `TemplateCoeffs` stores it as
//! `(c_const, [c_1, .., c_n])` rather than carrying a `Poly` past
//! preparation time.

use crate::integral::Integral;
use crate::modp::ModP;

/// `c(s) = constant + Σ per_index[i] * s[i]`.
#[derive(Clone, Debug)]
pub struct TemplateCoeffs {
    pub constant: ModP,
    pub per_index: Vec<ModP>,
}

impl TemplateCoeffs {
    pub fn new(constant: ModP, per_index: Vec<ModP>) -> Self {
        TemplateCoeffs { constant, per_index }
    }

    /// Evaluate `c(seed)` in `ModP`.
    pub fn eval(&self, seed: &Integral) -> ModP {
        let mut acc = self.constant;
        for (i, &c) in self.per_index.iter().enumerate() {
            if !c.is_zero() {
                acc = acc + c * ModP::from_i64(seed.get(i) as i64);
            }
        }
        acc
    }

    pub fn is_zero_everywhere(&self) -> bool {
        self.constant.is_zero() && self.per_index.iter().all(ModP::is_zero)
    }
}

/// One `(i, j)` operator's relation: a descending-`Δ`-ordered list of
/// `(Δ, c)` pairs. Applying the template at seed `s` yields equation
/// summands `(s + Δ, c(s))` for every entry whose target is in-range.
#[derive(Clone, Debug)]
pub struct IbpTemplateFF {
    terms: Vec<(Integral, TemplateCoeffs)>,
}

impl IbpTemplateFF {
    /// `terms` must already be sorted by descending `Δ` and free of
    /// identically-zero coefficients; `Family::prepare` builds them this way.
    pub fn new(terms: Vec<(Integral, TemplateCoeffs)>) -> Self {
        IbpTemplateFF { terms }
    }

    pub fn terms(&self) -> &[(Integral, TemplateCoeffs)] {
        &self.terms
    }
}
