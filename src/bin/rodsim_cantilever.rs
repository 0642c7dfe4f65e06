use gemlab::shapes::GeoKind;
use rodsim::base::{DofCatalog, Error, ParamMaterial, ParamRodModel, RodResult, SampleMeshes, Table};
use rodsim::fem::{ControlStatic, RodModel, SolverStatic, StepSummary, NDOF_PER_POINT};
use rodsim::material::{FunctionRegistry, ScalarFunction, N_STRAIN};
use russell_lab::Vector;
use serde::{Deserialize, Serialize};
use std::fs;
use structopt::StructOpt;

/// Command line options
#[derive(StructOpt, Debug)]
#[structopt(
    name = "rodsim_cantilever",
    about = "Solves a cantilever rod clamped at the first point and loaded at the tip"
)]
struct Options {
    /// JSON input file
    input: String,

    /// Writes the results (JSON) to this file
    #[structopt(short, long)]
    output: Option<String>,
}

/// Holds the input data
#[derive(Deserialize)]
struct Input {
    /// Length of the rod
    length: f64,

    /// Number of elements
    n_element: usize,

    /// Number of nodes per element (2, 3, or 4)
    #[serde(default = "default_nnode")]
    nnode: usize,

    /// Direction of the rod axis
    #[serde(default = "default_direction")]
    direction: [f64; 3],

    /// Force applied at the tip
    #[serde(default)]
    tip_force: [f64; 3],

    /// Moment applied at the tip
    #[serde(default)]
    tip_moment: [f64; 3],

    /// Limits of the six stress resultants used by the "normalized_resultants" yield function
    #[serde(default)]
    yield_limits: Option<[f64; N_STRAIN]>,

    /// Load-stepping control
    #[serde(default)]
    control: ControlStatic,

    /// Rod model
    model: ParamRodModel,
}

fn default_nnode() -> usize {
    2
}

fn default_direction() -> [f64; 3] {
    [1.0, 0.0, 0.0]
}

/// Holds the results written to the output file
#[derive(Serialize)]
struct Output {
    config: serde_json::Value,
    steps: Vec<StepSummary>,
    tip_displacement: Vec<f64>,
    potential_energy: f64,
    dissipated_energy: f64,
    strain: Option<Table>,
    stress: Option<Table>,
}

/// Registers f = ‖(σ + b) / Y‖ - 1 - h_iso with the arguments of the model
fn register_yield_function(registry: &mut FunctionRegistry, input: &Input) -> RodResult<()> {
    let limits = match input.yield_limits {
        Some(limits) => limits,
        None => return Ok(()),
    };
    if limits.iter().any(|y| !(*y > 0.0)) {
        return Err(Error::invalid_input("yield_limits must be positive"));
    }
    let (isotropic, kinematic) = match &input.model.material {
        ParamMaterial::ElastoPlasticRod { plastic, .. } => {
            (plastic.isotropic_coefficient.is_some(), plastic.kinematic_tensor.is_some())
        }
        ParamMaterial::ElasticRod(_) => (false, false),
    };
    let dofs = DofCatalog::new(&input.model.dof_names_trans, &input.model.dof_names_rot)?;
    let names = dofs.yield_arg_names(isotropic, kinematic);
    let names: Vec<&str> = names.iter().map(|s| s.as_str()).collect();
    let first_kin = if isotropic { N_STRAIN + 1 } else { N_STRAIN };
    let function = ScalarFunction::new(&names, move |x| {
        let mut sum = 0.0;
        for k in 0..N_STRAIN {
            let back = if kinematic { x[first_kin + k] } else { 0.0 };
            let r = (x[k] + back) / limits[k];
            sum += r * r;
        }
        let h_iso = if isotropic { x[N_STRAIN] } else { 0.0 };
        f64::sqrt(sum) - 1.0 - h_iso
    });
    registry.register("normalized_resultants", function);
    Ok(())
}

fn main() -> RodResult<()> {
    // parse options
    let options = Options::from_args();

    // load input
    let text = fs::read_to_string(&options.input)
        .map_err(|e| Error::invalid_input(format!("cannot read {}: {}", options.input, e)))?;
    let input: Input = serde_json::from_str(&text)
        .map_err(|e| Error::invalid_input(format!("cannot parse {}: {}", options.input, e)))?;

    // mesh and model
    let kind = match input.nnode {
        2 => GeoKind::Lin2,
        3 => GeoKind::Lin3,
        4 => GeoKind::Lin4,
        n => return Err(Error::invalid_input(format!("nnode must be 2, 3, or 4; got {}", n))),
    };
    let mesh = SampleMeshes::straight_rod(input.length, input.n_element, kind, &input.direction);
    let mut registry = FunctionRegistry::new();
    register_yield_function(&mut registry, &input)?;
    let mut model = RodModel::new(&mesh, &input.model, &registry)?;

    // boundary conditions and loads
    let neq = model.n_equation();
    let tip = model.n_point() - 1;
    let mut prescribed = vec![false; neq];
    for k in 0..NDOF_PER_POINT {
        prescribed[model.equation(0, k)] = true;
    }
    let mut f_ext = Vector::new(neq);
    for k in 0..3 {
        f_ext[model.equation(tip, k)] = input.tip_force[k];
        f_ext[model.equation(tip, 3 + k)] = input.tip_moment[k];
    }

    // solve
    let solver = SolverStatic::new(input.control.clone())?;
    let mut disp = Vector::new(neq);
    let steps = solver.solve(&mut model, &mut disp, &f_ext, &prescribed)?;

    // message
    let tip_displacement: Vec<f64> = (0..NDOF_PER_POINT).map(|k| disp[model.equation(tip, k)]).collect();
    let thin_line = format!("{:─^1$}", "", 60);
    println!("\n{}", thin_line);
    println!("{:>10}{:>12}{:>16}", "λ", "iterations", "max |R|");
    for step in &steps {
        println!("{:>10.4}{:>12}{:>16.3e}", step.load_factor, step.iterations, step.norm_rr);
    }
    println!("{}", thin_line);
    println!("tip displacement = {:?}", &tip_displacement[0..3]);
    println!("tip rotation     = {:?}", &tip_displacement[3..6]);
    println!("potential energy = {:e}", model.potential_energy());
    println!("dissipated energy = {:e}", model.dissipated_energy());
    println!("{}\n", thin_line);

    // output
    if let Some(path) = &options.output {
        let results = Output {
            config: model.config()?,
            potential_energy: model.potential_energy(),
            dissipated_energy: model.dissipated_energy(),
            strain: model.element_table("mat_strain", &disp)?,
            stress: model.element_table("mat_stress", &disp)?,
            steps,
            tip_displacement,
        };
        let json = serde_json::to_string_pretty(&results).map_err(|e| Error::invalid_input(e.to_string()))?;
        fs::write(path, json).map_err(|e| Error::invalid_input(format!("cannot write {}: {}", path, e)))?;
        println!("results written to {}", path);
    }
    Ok(())
}
