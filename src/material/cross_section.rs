use crate::base::{Error, ParamRod, RodResult};
use serde::Serialize;
use std::f64::consts::PI;

/// Defines the shape of the cross section
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub enum SectionShape {
    /// Area and moments given explicitly
    Explicit,

    /// Square with side length
    Square(f64),

    /// Rectangle with side lengths (b₀, b₁)
    Rectangle(f64, f64),

    /// Circle with radius
    Circle(f64),
}

/// Holds the resolved properties of a rod cross section
///
/// The bending moment `area_moment[0]` refers to bending about the first
/// material axis and `area_moment[1]` about the second one. The third material
/// axis is the rod axis.
#[derive(Clone, Debug, Serialize)]
pub struct SectionProperties {
    /// Shape of the cross section
    pub shape: SectionShape,

    /// Young's modulus E
    pub young: f64,

    /// Shear modulus G
    pub shear_modulus: f64,

    /// Cross-sectional area A
    pub area: f64,

    /// Area moments of inertia (I₁, I₂)
    pub area_moment: [f64; 2],

    /// Polar moment of inertia J
    pub polar_moment: f64,

    /// Shear correction factor k
    pub shear_correction: f64,

    /// Intrinsic density ρ
    pub density: f64,
}

impl SectionProperties {
    /// Resolves the cross section from parameters
    ///
    /// # Input
    ///
    /// * `param` -- the parameters
    /// * `name` -- identifies the material instance in error messages
    pub fn new(param: &ParamRod, name: &str) -> RodResult<Self> {
        let context = format!("material '{}'", name);
        let positive = |key: &str, value: f64| -> RodResult<f64> {
            if value > 0.0 && value.is_finite() {
                Ok(value)
            } else {
                Err(Error::config(&context, format!("{} = {} must be positive", key, value)))
            }
        };

        // elastic moduli
        let young = positive("young", param.young)?;
        let shear_modulus = match (param.shear_modulus, param.poisson_ratio) {
            (Some(gg), _) => positive("shear_modulus", gg)?,
            (None, Some(nu)) => {
                if nu <= -1.0 || nu >= 0.5 {
                    return Err(Error::config(
                        &context,
                        format!("poisson_ratio = {} must be in (-1, 0.5)", nu),
                    ));
                }
                young / (2.0 * (1.0 + nu))
            }
            (None, None) => {
                return Err(Error::config(
                    &context,
                    "missing property: shear_modulus or poisson_ratio",
                ))
            }
        };

        // geometry
        let (shape, area, area_moment, default_correction) = match param.cross_section.as_deref() {
            None => {
                let area = match param.area {
                    Some(a) => positive("area", a)?,
                    None => return Err(Error::config(&context, "missing property: area")),
                };
                let moments = match &param.area_moment {
                    Some(m) => m,
                    None => return Err(Error::config(&context, "missing property: area_moment")),
                };
                let area_moment = match moments.len() {
                    1 => [positive("area_moment", moments[0])?; 2],
                    2 => [positive("area_moment", moments[0])?, positive("area_moment", moments[1])?],
                    n => {
                        return Err(Error::config(
                            &context,
                            format!("area_moment requires 1 or 2 values; got {}", n),
                        ))
                    }
                };
                (SectionShape::Explicit, area, area_moment, 5.0 / 6.0)
            }
            Some("square") => {
                let s = match param.side_length.as_deref() {
                    Some([s]) => positive("side_length", *s)?,
                    _ => return Err(Error::config(&context, "square requires side_length with 1 value")),
                };
                let i = s * s * s * s / 12.0;
                (SectionShape::Square(s), s * s, [i, i], 5.0 / 6.0)
            }
            Some("rectangle") => {
                let (s0, s1) = match param.side_length.as_deref() {
                    Some([s0, s1]) => (positive("side_length", *s0)?, positive("side_length", *s1)?),
                    _ => return Err(Error::config(&context, "rectangle requires side_length with 2 values")),
                };
                let i0 = s1 * s1 * s1 * s0 / 12.0;
                let i1 = s0 * s0 * s0 * s1 / 12.0;
                (SectionShape::Rectangle(s0, s1), s0 * s1, [i0, i1], 5.0 / 6.0)
            }
            Some("circle") => {
                let r = match param.radius {
                    Some(r) => positive("radius", r)?,
                    None => return Err(Error::config(&context, "circle requires radius")),
                };
                let i = PI * r * r * r * r / 4.0;
                (SectionShape::Circle(r), PI * r * r, [i, i], 9.0 / 10.0)
            }
            Some(other) => {
                return Err(Error::invalid_input(format!(
                    "unknown cross_section '{}' in {}; use rectangle, square, or circle",
                    other, context
                )))
            }
        };

        let polar_moment = match param.polar_moment {
            Some(j) => positive("polar_moment", j)?,
            None => area_moment[0] + area_moment[1],
        };
        let shear_correction = match param.shear_correction {
            Some(k) => positive("shear_correction", k)?,
            None => default_correction,
        };
        if !(param.density >= 0.0) {
            return Err(Error::config(
                &context,
                format!("density = {} must be non-negative", param.density),
            ));
        }
        Ok(SectionProperties {
            shape,
            young,
            shear_modulus,
            area,
            area_moment,
            polar_moment,
            shear_correction,
            density: param.density,
        })
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
