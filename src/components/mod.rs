//! # Components
//!
//! A [`Component`] is a named geometric primitive that owns an ordered list of
//! parameters and computes both its complex visibility at arbitrary spatial
//! frequencies and its intensity image on a pixel grid.
//!
//! Components come in four kinds:
//!
//! - **Analytic** shapes with closed-form visibilities ([`Shape`]).
//! - **Convolutions** of two components.
//! - **Grid** components built from a user image or chromatic image cube,
//!   whose visibility is interpolated from a cached FFT.
//! - **Radial** components built from a radial intensity profile, whose
//!   visibility is a numerical Hankel transform.
//!
//! Every component has the parameters `x`, `y` (position, mas) and `f`
//! (flux). Components built with `elong` or `pa` options, and the elliptic
//! constructors, also carry `elong` and `pa`.
//!
//! ```
//! use visfit_rs::components::Component;
//!
//! let disk = Component::uniform_disk(&[("d", 5.0.into()), ("f", 0.5.into())]).unwrap();
//! let vis = disk.complex_coherent_flux(&[0.0], &[0.0], None, None).unwrap();
//! assert!((vis[0].re - 0.5).abs() < 1e-12);
//! ```

pub mod convolution;
pub mod image;
pub mod radial;
pub mod shape;
pub mod transform;

pub use convolution::Convolution;
pub use image::{GridConfig, GridImage, GridInterpolation, OutOfGrid};
pub use radial::RadialProfile;
pub use shape::Shape;
pub use transform::{Frame, PixelGrid};

use crate::error::{Result, VisFitError};
use crate::parameters::value::{broadcast_len, pick};
use crate::parameters::{
    standard_parameter, Interp, LinkedParameter, ModelParam, NormalizationParameter, Parameter,
    SharedParameter,
};
use ndarray::{Array1, Array2, Array3};
use num_complex::Complex64;
use std::fmt;
use transform::{normalize_flux, shape_rotation, translate_factor};

/// Value given for a component option at construction (or through
/// [`Component::set`]).
#[derive(Debug, Clone)]
pub enum OptionValue {
    /// Assign a plain value.
    Value(f64),
    /// Turn the parameter into a wavelength- or time-interpolated one.
    Interp(Interp),
    /// Replace the parameter, e.g. by a linked or shared one.
    Param(ModelParam),
}

impl From<f64> for OptionValue {
    fn from(v: f64) -> Self {
        OptionValue::Value(v)
    }
}

impl From<Interp> for OptionValue {
    fn from(v: Interp) -> Self {
        OptionValue::Interp(v)
    }
}

impl From<ModelParam> for OptionValue {
    fn from(v: ModelParam) -> Self {
        OptionValue::Param(v)
    }
}

impl From<Parameter> for OptionValue {
    fn from(v: Parameter) -> Self {
        OptionValue::Param(v.into())
    }
}

impl From<SharedParameter> for OptionValue {
    fn from(v: SharedParameter) -> Self {
        OptionValue::Param(v.into())
    }
}

impl From<LinkedParameter> for OptionValue {
    fn from(v: LinkedParameter) -> Self {
        OptionValue::Param(v.into())
    }
}

impl From<NormalizationParameter> for OptionValue {
    fn from(v: NormalizationParameter) -> Self {
        OptionValue::Param(v.into())
    }
}

/// How a component computes its visibility and image.
#[derive(Debug, Clone)]
pub enum ComponentKind {
    Analytic(Shape),
    Convolution(Box<Convolution>),
    Grid(GridImage),
    Radial(RadialProfile),
}

/// Parameter values of a component evaluated at a set of conditions.
///
/// Each array holds either one value (condition-independent) or one value
/// per condition.
#[derive(Debug, Clone)]
pub struct ParamSamples {
    entries: Vec<(String, Array1<f64>, f64)>,
}

impl ParamSamples {
    pub fn evaluate(
        params: &[(String, ModelParam)],
        wl: Option<&[f64]>,
        t: Option<&[f64]>,
    ) -> Result<Self> {
        let entries = params
            .iter()
            .map(|(name, p)| {
                let to_rad = p.unit().to_rad().unwrap_or(1.0);
                Ok((name.clone(), p.evaluate_many(wl, t)?, to_rad))
            })
            .collect::<Result<_>>()?;
        Ok(Self { entries })
    }

    /// View on the values of condition `index`.
    pub fn at(&self, index: usize) -> Sampled<'_> {
        Sampled {
            samples: self,
            index,
        }
    }
}

/// Parameter values at one condition.
#[derive(Debug, Clone, Copy)]
pub struct Sampled<'a> {
    samples: &'a ParamSamples,
    index: usize,
}

impl<'a> Sampled<'a> {
    fn lookup(&self, name: &str) -> Option<(f64, f64)> {
        self.samples
            .entries
            .iter()
            .find(|(n, _, _)| n == name)
            .map(|(_, values, to_rad)| {
                let i = if values.len() == 1 { 0 } else { self.index };
                (values[i], *to_rad)
            })
    }

    /// Value in the parameter's own unit; absent parameters read as 0.
    pub fn get(&self, name: &str) -> f64 {
        self.lookup(name).map_or(0.0, |(v, _)| v)
    }

    /// Like [`get`](Self::get), with an explicit fallback.
    pub fn get_or(&self, name: &str, default: f64) -> f64 {
        self.lookup(name).map_or(default, |(v, _)| v)
    }

    /// Value converted to radians (angular units only; others unchanged).
    pub fn rad(&self, name: &str) -> f64 {
        self.lookup(name).map_or(0.0, |(v, k)| v * k)
    }
}

/// A geometric primitive of a model.
#[derive(Debug, Clone)]
pub struct Component {
    name: String,
    shortname: String,
    description: String,
    params: Vec<(String, ModelParam)>,
    elliptic: bool,
    kind: ComponentKind,
}

fn standard(name: &str) -> ModelParam {
    standard_parameter(name)
        .unwrap_or_else(|| Parameter::new(name, 0.0))
        .into()
}

fn position_and_flux(elliptic: bool) -> Vec<(String, ModelParam)> {
    let mut names = vec!["x", "y", "f"];
    if elliptic {
        names.extend(["elong", "pa"]);
    }
    names
        .into_iter()
        .map(|n| (n.to_string(), standard(n)))
        .collect()
}

fn wants_ellipticity(options: &[(&str, OptionValue)]) -> bool {
    options.iter().any(|(n, _)| *n == "elong" || *n == "pa")
}

impl Component {
    fn build(
        name: &str,
        shortname: &str,
        description: &str,
        elliptic: bool,
        extra: &[&str],
        kind: ComponentKind,
        options: &[(&str, OptionValue)],
    ) -> Result<Self> {
        let mut params = position_and_flux(elliptic);
        params.extend(extra.iter().map(|n| (n.to_string(), standard(n))));
        let mut component = Self {
            name: name.to_string(),
            shortname: shortname.to_string(),
            description: description.to_string(),
            params,
            elliptic,
            kind,
        };
        for (name, value) in options {
            component.set(name, value.clone())?;
        }
        Ok(component)
    }

    /// Analytic component. It is elliptic when the options mention `elong`
    /// or `pa`.
    pub fn analytic(shape: Shape, options: &[(&str, OptionValue)]) -> Result<Self> {
        Self::analytic_with(shape, wants_ellipticity(options), options)
    }

    /// Analytic component that always carries `elong` and `pa`.
    pub fn analytic_elliptic(shape: Shape, options: &[(&str, OptionValue)]) -> Result<Self> {
        Self::analytic_with(shape, true, options)
    }

    fn analytic_with(shape: Shape, elliptic: bool, options: &[(&str, OptionValue)]) -> Result<Self> {
        Self::build(
            shape.name(elliptic),
            shape.shortname(elliptic),
            "Component analytically defined in the Fourier plane",
            elliptic,
            shape.param_names(),
            ComponentKind::Analytic(shape),
            options,
        )
    }

    pub fn point(options: &[(&str, OptionValue)]) -> Result<Self> {
        Self::analytic(Shape::Point, options)
    }

    pub fn background(options: &[(&str, OptionValue)]) -> Result<Self> {
        Self::analytic(Shape::Background, options)
    }

    pub fn uniform_disk(options: &[(&str, OptionValue)]) -> Result<Self> {
        Self::analytic(Shape::UniformDisk, options)
    }

    pub fn ellipse(options: &[(&str, OptionValue)]) -> Result<Self> {
        Self::analytic_elliptic(Shape::UniformDisk, options)
    }

    pub fn gaussian(options: &[(&str, OptionValue)]) -> Result<Self> {
        Self::analytic(Shape::Gaussian, options)
    }

    pub fn elliptic_gaussian(options: &[(&str, OptionValue)]) -> Result<Self> {
        Self::analytic_elliptic(Shape::Gaussian, options)
    }

    pub fn iring(options: &[(&str, OptionValue)]) -> Result<Self> {
        Self::analytic(Shape::InfinitesimalRing, options)
    }

    pub fn elliptic_iring(options: &[(&str, OptionValue)]) -> Result<Self> {
        Self::analytic_elliptic(Shape::InfinitesimalRing, options)
    }

    pub fn ring(options: &[(&str, OptionValue)]) -> Result<Self> {
        Self::analytic(Shape::Ring, options)
    }

    pub fn elliptic_ring(options: &[(&str, OptionValue)]) -> Result<Self> {
        Self::analytic_elliptic(Shape::Ring, options)
    }

    /// Component from a single image, `[row = y, col = x]`, with pixel size
    /// `pix_size` in mas.
    pub fn from_image(
        image: Array2<f64>,
        pix_size: f64,
        options: &[(&str, OptionValue)],
    ) -> Result<Self> {
        let (ny, nx) = image.dim();
        let cube = image.into_shape((1, ny, nx)).map_err(|e| {
            VisFitError::Configuration(format!("cannot use image as a cube: {}", e))
        })?;
        Self::from_cube(cube, Vec::new(), pix_size, options)
    }

    /// Component from a chromatic image cube `[wl, y, x]` sampled at the
    /// wavelengths `wl` (m). An empty `wl` is allowed for a single slice.
    pub fn from_cube(
        cube: Array3<f64>,
        wl: Vec<f64>,
        pix_size: f64,
        options: &[(&str, OptionValue)],
    ) -> Result<Self> {
        let grid = GridImage::new(cube, wl)?;
        let dim = grid.native_dim() as f64;
        let elliptic = wants_ellipticity(options);
        let mut component = Self::build(
            "Image component",
            "Img",
            "Component defined by a pixelized image",
            elliptic,
            &["pixSize", "dim"],
            ComponentKind::Grid(grid),
            &[],
        )?;
        component.set("pixSize", pix_size)?;
        component.set("dim", dim)?;
        for (name, value) in options {
            component.set(name, value.clone())?;
        }
        Ok(component)
    }

    /// Replace the interpolation settings of a grid component.
    pub fn with_grid_config(mut self, config: GridConfig) -> Self {
        if let ComponentKind::Grid(grid) = &mut self.kind {
            grid.set_config(config);
        }
        self
    }

    /// Component from a radial intensity profile sampled at radii `r` (mas).
    pub fn radial_profile(
        r: Vec<f64>,
        intensity: Vec<f64>,
        options: &[(&str, OptionValue)],
    ) -> Result<Self> {
        let profile = RadialProfile::sampled(r, intensity)?;
        Self::build(
            "Radial profile",
            "RadP",
            "Component defined by a radial intensity profile",
            wants_ellipticity(options),
            &[],
            ComponentKind::Radial(profile),
            options,
        )
    }

    /// Ring with an exponentially decaying profile outside `din`, with scale
    /// length `w`, sampled on `dim` radii.
    pub fn exponential_ring(options: &[(&str, OptionValue)]) -> Result<Self> {
        let mut component = Self::build(
            "Exponential Ring",
            "ExpR",
            "Ring with an exponential radial profile",
            wants_ellipticity(options),
            &["din", "w", "dim"],
            ComponentKind::Radial(RadialProfile::ExponentialRing),
            &[],
        )?;
        component.set("dim", 256.0)?;
        for (name, value) in options {
            component.set(name, value.clone())?;
        }
        Ok(component)
    }

    /// Convolution of `base` by `kernel`. The operands' parameters are
    /// exposed with the prefixes `c1_` and `c2_`.
    pub fn convolution(base: Component, kernel: Component) -> Result<Self> {
        let conv = Convolution::new(base, kernel)?;
        let name = format!("Convolution of {} by {}", conv.base().name(), conv.kernel().name());
        Ok(Self {
            name,
            shortname: "Conv".to_string(),
            description: "Convolution of two components".to_string(),
            params: conv.prefixed_params(),
            elliptic: false,
            kind: ComponentKind::Convolution(Box::new(conv)),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn shortname(&self) -> &str {
        &self.shortname
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn is_elliptic(&self) -> bool {
        self.elliptic
    }

    pub fn kind(&self) -> &ComponentKind {
        &self.kind
    }

    /// Parameters in declaration order.
    pub fn params(&self) -> &[(String, ModelParam)] {
        &self.params
    }

    pub fn param(&self, name: &str) -> Option<&ModelParam> {
        self.params.iter().find(|(n, _)| n == name).map(|(_, p)| p)
    }

    /// Assign a value, an interpolation or a replacement parameter to the
    /// parameter `name`. Unknown names are rejected.
    pub fn set(&mut self, name: &str, value: impl Into<OptionValue>) -> Result<()> {
        let value = value.into();
        if let ComponentKind::Convolution(conv) = &mut self.kind {
            conv.set(name, value)?;
            self.params = conv.prefixed_params();
            return Ok(());
        }

        let known: Vec<&str> = self.params.iter().map(|(n, _)| n.as_str()).collect();
        let idx = self
            .params
            .iter()
            .position(|(n, _)| n == name)
            .ok_or_else(|| {
                VisFitError::Configuration(format!(
                    "{} has no parameter '{}'; known parameters: {}",
                    self.name,
                    name,
                    known.join(", ")
                ))
            })?;

        let slot = &mut self.params[idx].1;
        match value {
            OptionValue::Value(v) => match slot {
                ModelParam::Plain(p) => p.set_value(v),
                _ => {
                    let mut template = template_of(slot, name);
                    template.set_value(v);
                    *slot = template.into();
                }
            },
            OptionValue::Interp(interp) => {
                let template = template_of(slot, name);
                *slot = interp.build(&template)?.into();
            }
            OptionValue::Param(p) => *slot = p,
        }
        Ok(())
    }

    /// Complex coherent flux at the spatial frequencies `(u, v)` (cycles/rad).
    ///
    /// `wl` (m) and `t` (MJD s) are either absent, of length 1, or of the
    /// same length as `u`.
    pub fn complex_coherent_flux(
        &self,
        u: &[f64],
        v: &[f64],
        wl: Option<&[f64]>,
        t: Option<&[f64]>,
    ) -> Result<Array1<Complex64>> {
        if let ComponentKind::Convolution(conv) = &self.kind {
            return conv.complex_coherent_flux(u, v, wl, t);
        }
        let n = check_coordinates(u, v, wl, t)?;
        let samples = ParamSamples::evaluate(&self.params, wl, t)?;
        let shape_vis = self.normalized_visibility(u, v, wl, &samples)?;
        Ok(Array1::from_shape_fn(n, |i| {
            let p = samples.at(i);
            shape_vis[i] * translate_factor(u[i], v[i], p.rad("x"), p.rad("y")) * p.get("f")
        }))
    }

    /// Visibility of the shape alone: frame transform and shape formula,
    /// without translation or flux. Equals 1 at zero frequency.
    pub fn shape_visibility(
        &self,
        u: &[f64],
        v: &[f64],
        wl: Option<&[f64]>,
        t: Option<&[f64]>,
    ) -> Result<Array1<Complex64>> {
        if let ComponentKind::Convolution(conv) = &self.kind {
            return conv.shape_visibility(u, v, wl, t);
        }
        check_coordinates(u, v, wl, t)?;
        let samples = ParamSamples::evaluate(&self.params, wl, t)?;
        self.normalized_visibility(u, v, wl, &samples)
    }

    fn rotation(&self, pa_rad: f64) -> f64 {
        match self.kind {
            ComponentKind::Grid(_) => pa_rad,
            _ => shape_rotation(pa_rad),
        }
    }

    fn frame(&self, u: f64, v: f64, p: &Sampled) -> Frame {
        if self.elliptic {
            Frame::elliptic(u, v, self.rotation(p.rad("pa")), p.get_or("elong", 1.0))
        } else {
            Frame::circular(u, v)
        }
    }

    fn normalized_visibility(
        &self,
        u: &[f64],
        v: &[f64],
        wl: Option<&[f64]>,
        samples: &ParamSamples,
    ) -> Result<Array1<Complex64>> {
        let n = u.len();
        match &self.kind {
            ComponentKind::Analytic(shape) => Ok(Array1::from_shape_fn(n, |i| {
                let p = samples.at(i);
                shape.visibility(&self.frame(u[i], v[i], &p), &p)
            })),
            ComponentKind::Grid(grid) => {
                let p0 = samples.at(0);
                let transform = grid.transform(p0.rad("pixSize"), p0.get("dim"))?;
                Ok(Array1::from_shape_fn(n, |i| {
                    let p = samples.at(i);
                    transform.sample(&self.frame(u[i], v[i], &p), pick(wl, i), grid.config())
                }))
            }
            ComponentKind::Radial(profile) => {
                let mut out = Array1::zeros(n);
                for i in 0..n {
                    let p = samples.at(i);
                    let frame = self.frame(u[i], v[i], &p);
                    out[i] = Complex64::new(profile.visibility(frame.rho, &p)?, 0.0);
                }
                Ok(out)
            }
            ComponentKind::Convolution(conv) => conv.shape_visibility(u, v, wl, None),
        }
    }

    /// Image of the component on a `dim x dim` grid with pixel size
    /// `pix_size` (mas), summing to the flux `f`.
    pub fn image(&self, dim: usize, pix_size: f64, wl: Option<f64>, t: Option<f64>) -> Result<Array2<f64>> {
        if let ComponentKind::Convolution(conv) = &self.kind {
            return conv.image(dim, pix_size, wl, t);
        }
        let wl_slice = wl.as_ref().map(std::slice::from_ref);
        let t_slice = t.as_ref().map(std::slice::from_ref);
        let samples = ParamSamples::evaluate(&self.params, wl_slice, t_slice)?;
        let p = samples.at(0);

        let mut grid = PixelGrid::centered(dim, pix_size).translate(p.get("x"), p.get("y"));
        if self.elliptic {
            grid = grid.ellipticize(self.rotation(p.rad("pa")), p.get_or("elong", 1.0));
        }

        let image = match &self.kind {
            ComponentKind::Analytic(shape) => shape.image(&grid, &p),
            ComponentKind::Grid(g) => g.render(&grid, &p, wl),
            ComponentKind::Radial(profile) => profile.render(&grid, &p)?,
            ComponentKind::Convolution(_) => unreachable!("handled above"),
        };
        Ok(normalize_flux(image, p.get("f")))
    }
}

fn template_of(slot: &ModelParam, name: &str) -> Parameter {
    match slot {
        ModelParam::Plain(p) => p.snapshot(),
        ModelParam::Interpolated(ip) => ip
            .params()
            .first()
            .map(|p| p.snapshot())
            .unwrap_or_else(|| Parameter::new(name, 0.0)),
        _ => standard_parameter(name).unwrap_or_else(|| Parameter::new(name, 0.0)),
    }
}

/// Validate coordinate arrays and return the number of points.
pub(crate) fn check_coordinates(
    u: &[f64],
    v: &[f64],
    wl: Option<&[f64]>,
    t: Option<&[f64]>,
) -> Result<usize> {
    if u.len() != v.len() {
        return Err(VisFitError::DimensionMismatch(format!(
            "u and v must have the same length ({} != {})",
            u.len(),
            v.len()
        )));
    }
    let n = u.len();
    for (label, arr) in [("wl", wl), ("t", t)] {
        if let Some(a) = arr {
            if a.len() != 1 && a.len() != n {
                return Err(VisFitError::DimensionMismatch(format!(
                    "{} must have length 1 or {} (got {})",
                    label,
                    n,
                    a.len()
                )));
            }
        }
    }
    if n > 0 {
        broadcast_len(&[Some(u), wl, t])?;
    }
    Ok(n)
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        for (name, param) in &self.params {
            write!(f, " {}={:.2}", name, param.evaluate(None, None))?;
        }
        Ok(())
    }
}
