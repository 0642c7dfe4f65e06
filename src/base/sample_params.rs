use super::{ParamPlastic, ParamRod};

/// Holds samples of rod parameters
pub struct SampleParams {}

impl SampleParams {
    /// Returns a steel rod with circular cross section (SI units)
    pub fn param_steel_circle(radius: f64) -> ParamRod {
        ParamRod {
            young: 210e9,                          // Pa
            poisson_ratio: Some(0.3),              // -
            cross_section: Some("circle".into()),  //
            radius: Some(radius),                  // m
            density: 7850.0,                       // kg/m³
            ..Default::default()
        }
    }

    /// Returns a rod with explicit (unit-like) section properties
    ///
    /// ```text
    /// E = 1000, G = 400, A = 1, I₁ = I₂ = 0.1, J = 0.2, k = 5/6
    /// ```
    pub fn param_unit_section() -> ParamRod {
        ParamRod {
            young: 1000.0,
            shear_modulus: Some(400.0),
            area: Some(1.0),
            area_moment: Some(vec![0.1]),
            density: 1.0,
            ..Default::default()
        }
    }

    /// Returns plastic parameters with a registered yield function name
    pub fn param_plastic(yield_cond: &str, hardening_iso: Option<f64>, kinematic: Option<Vec<f64>>) -> ParamPlastic {
        ParamPlastic {
            yield_cond: yield_cond.to_string(),
            yield_deriv: None,
            isotropic_coefficient: hardening_iso,
            kinematic_tensor: kinematic,
            max_iter: 20,
            precision: 1e-10,
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::SampleParams;

    #[test]
    fn sample_params_work() {
        let p = SampleParams::param_steel_circle(0.01);
        assert_eq!(p.young, 210e9);
        assert_eq!(p.cross_section.as_deref(), Some("circle"));
        let p = SampleParams::param_unit_section();
        assert_eq!(p.area, Some(1.0));
        let p = SampleParams::param_plastic("f", Some(1.0), None);
        assert_eq!(p.max_iter, 20);
        assert_eq!(p.isotropic_coefficient, Some(1.0));
    }
}
