use gemlab::shapes::GeoKind;
use rodsim::base::{ParamMaterial, ParamRodModel, RodResult, SampleMeshes, SampleParams};
use rodsim::fem::{ControlStatic, RodModel, SolverStatic, NDOF_PER_POINT};
use rodsim::material::FunctionRegistry;
use russell_lab::{approx_eq, Vector};
use std::f64::consts::PI;

/// Returns the prescribed flags of a rod clamped at the first point
fn clamped(model: &RodModel) -> Vec<bool> {
    let mut prescribed = vec![false; model.n_equation()];
    for k in 0..NDOF_PER_POINT {
        prescribed[model.equation(0, k)] = true;
    }
    prescribed
}

// Timoshenko cantilever with a small tip force
//
//  ▒▒▒█────────────────────────● ↓ P
//  ▒▒▒█                            δ = P L³ / (3 E I) + P L / (k G A)
#[test]
fn test_cantilever_tip_force() -> RodResult<()> {
    let (length, radius, force) = (1.0, 0.01, 1.0);
    let n_element = 20;
    let param_rod = SampleParams::param_steel_circle(radius);
    let param = ParamRodModel::new(ParamMaterial::ElasticRod(param_rod));
    let mesh = SampleMeshes::straight_rod(length, n_element, GeoKind::Lin2, &[1.0, 0.0, 0.0]);
    let mut model = RodModel::new(&mesh, &param, &FunctionRegistry::new())?;

    let neq = model.n_equation();
    let tip = model.n_point() - 1;
    let prescribed = clamped(&model);
    let mut f_ext = Vector::new(neq);
    f_ext[model.equation(tip, 1)] = -force;

    let mut control = ControlStatic::default();
    control.n_step = 1;
    let solver = SolverStatic::new(control)?;
    let mut disp = Vector::new(neq);
    solver.solve(&mut model, &mut disp, &f_ext, &prescribed)?;

    let section = &model.material.elastic().section;
    let ei = section.young * section.area_moment[0];
    let kga = section.shear_correction * section.shear_modulus * section.area;
    let delta = force * length * length * length / (3.0 * ei) + force * length / kga;
    let tip_deflection = -disp[model.equation(tip, 1)];
    println!("δ = {:e}, correct = {:e}", tip_deflection, delta);
    assert!(f64::abs(tip_deflection - delta) / delta < 0.02);

    // tip rotation θ = P L² / (2 E I) about -z
    let theta = force * length * length / (2.0 * ei);
    assert!(f64::abs(-disp[model.equation(tip, 5)] - theta) / theta < 0.02);

    // work of the external force is stored as potential energy
    let work = 0.5 * force * tip_deflection;
    assert!(f64::abs(model.potential_energy() - work) / work < 1e-3);
    Ok(())
}

// Cantilever rolled into a quarter circle by a tip moment M = (π/2) E I / L
//
//        y
//        ↑     ●  (R, R) with R = 2L/π
//        |   .'
//        | .'
//  ▒▒▒█──'───→ x
#[test]
fn test_cantilever_tip_moment() -> RodResult<()> {
    let length = 1.0;
    let param = ParamRodModel::new(ParamMaterial::ElasticRod(SampleParams::param_unit_section()));
    for kind in [GeoKind::Lin2, GeoKind::Lin3] {
        let mesh = SampleMeshes::straight_rod(length, 20, kind, &[1.0, 0.0, 0.0]);
        let mut model = RodModel::new(&mesh, &param, &FunctionRegistry::new())?;

        let neq = model.n_equation();
        let tip = model.n_point() - 1;
        let prescribed = clamped(&model);
        let ei = 1000.0 * 0.1;
        let moment = 0.5 * PI * ei / length;
        let mut f_ext = Vector::new(neq);
        f_ext[model.equation(tip, 5)] = moment;

        let mut control = ControlStatic::default();
        control.n_step = 20;
        control.n_max_iterations = 30;
        let solver = SolverStatic::new(control)?;
        let mut disp = Vector::new(neq);
        let steps = solver.solve(&mut model, &mut disp, &f_ext, &prescribed)?;
        assert_eq!(steps.len(), 20);

        let radius = 2.0 * length / PI;
        let ux = disp[model.equation(tip, 0)];
        let uy = disp[model.equation(tip, 1)];
        println!("{:?}: tip = ({}, {}), correct = ({}, {})", kind, length + ux, uy, radius, radius);
        assert!(f64::abs(length + ux - radius) / radius < 1e-2);
        assert!(f64::abs(uy - radius) / radius < 1e-2);
        approx_eq(disp[model.equation(tip, 5)], 0.5 * PI, 1e-6);

        // constant (spatial) curvature M / EI about z
        let kappa = moment / ei;
        let table = model.element_table("strain", &disp)?.unwrap();
        for value in table.column("kappa_2").unwrap() {
            approx_eq(*value, kappa, 1e-6);
        }
        approx_eq(model.potential_energy(), 0.5 * moment * 0.5 * PI, 1e-4);
    }
    Ok(())
}
