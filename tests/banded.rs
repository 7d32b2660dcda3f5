use approx::assert_relative_eq;
use numint::integrate::{ODEMethod, ODEOptions, solve_ivp};
use numint::linalg::{BandedMatrix, DenseMatrix, LuFactors, solve_banded, solve_dense};

/// Pentadiagonal, diagonally dominant test matrix.
fn pentadiagonal(n: usize) -> DenseMatrix {
    let mut a = DenseMatrix::zeros(n);
    for i in 0..n {
        a.set(i, i, 6.0 + i as f64 * 0.01);
        if i >= 1 {
            a.set(i, i - 1, -1.5);
        }
        if i >= 2 {
            a.set(i, i - 2, 0.5);
        }
        if i + 1 < n {
            a.set(i, i + 1, -2.0);
        }
        if i + 2 < n {
            a.set(i, i + 2, 0.25);
        }
    }
    a
}

#[test]
fn banded_solve_matches_dense() {
    let n = 50;
    let dense = pentadiagonal(n);
    let banded = BandedMatrix::from_dense(&dense, 2, 2).unwrap();
    let b: Vec<f64> = (0..n).map(|i| (i as f64 * 0.37).sin()).collect();

    let x_band = solve_banded(2, 2, banded.as_slice(), &b).unwrap();
    let x_dense = solve_dense(&dense, &b).unwrap();
    for (u, v) in x_band.iter().zip(&x_dense) {
        assert_relative_eq!(*u, *v, epsilon = 1e-12, max_relative = 1e-10);
    }

    let residual: Vec<f64> = dense
        .mul_vec(&x_band)
        .iter()
        .zip(&b)
        .map(|(ax, bi)| ax - bi)
        .collect();
    assert!(residual.iter().all(|r| r.abs() < 1e-12));
}

#[test]
fn banded_factorization_is_cheaper() {
    let n = 200;
    let dense = pentadiagonal(n);
    let banded = BandedMatrix::from_dense(&dense, 2, 2).unwrap();

    let dense_lu = dense.lu().unwrap();
    let banded_lu = banded.lu().unwrap();
    assert_eq!(dense_lu.dim(), banded_lu.dim());
    assert!(
        banded_lu.flops() * 100 < dense_lu.flops(),
        "banded {} vs dense {}",
        banded_lu.flops(),
        dense_lu.flops()
    );
}

const F: f64 = 0.04;
const K: f64 = 0.06;
const DU: f64 = 2e-3;
const DV: f64 = 1e-3;

/// 1-D Gray-Scott reaction-diffusion with zero-flux ends. Species are
/// interleaved `[u0, v0, u1, v1, ...]`, so the Jacobian has two sub- and two
/// super-diagonals.
fn gray_scott(cells: usize) -> impl Fn(f64, &[f64]) -> Vec<f64> + Copy {
    move |_t, y| {
        let dx = 1.0 / cells as f64;
        let inv_dx2 = 1.0 / (dx * dx);
        let mut dy = vec![0.0; 2 * cells];
        for i in 0..cells {
            let left = if i == 0 { 1 } else { i - 1 };
            let right = if i + 1 == cells { cells - 2 } else { i + 1 };
            let (u, v) = (y[2 * i], y[2 * i + 1]);
            let lap_u = (y[2 * left] - 2.0 * u + y[2 * right]) * inv_dx2;
            let lap_v = (y[2 * left + 1] - 2.0 * v + y[2 * right + 1]) * inv_dx2;
            let uvv = u * v * v;
            dy[2 * i] = DU * lap_u - uvv + F * (1.0 - u);
            dy[2 * i + 1] = DV * lap_v + uvv - (F + K) * v;
        }
        dy
    }
}

fn gray_scott_initial(cells: usize) -> Vec<f64> {
    let mut y0 = Vec::with_capacity(2 * cells);
    for i in 0..cells {
        let x = (i as f64 + 0.5) / cells as f64;
        let bump = (-100.0 * (x - 0.5) * (x - 0.5)).exp();
        y0.push(1.0 - 0.5 * bump);
        y0.push(0.25 * bump);
    }
    y0
}

#[test]
fn gray_scott_banded_matches_dense() {
    let cells = 40;
    let rhs = gray_scott(cells);
    let y0 = gray_scott_initial(cells);
    let base = ODEOptions::with_tolerances(1e-6, 1e-9).method(ODEMethod::SDIRK4);

    let dense = solve_ivp(rhs, [0.0, 20.0], &y0, &base).unwrap();
    let banded = solve_ivp(rhs, [0.0, 20.0], &y0, &base.clone().banded_jacobian(2, 2)).unwrap();

    assert!(dense.success() && banded.success());
    for (a, b) in dense.y_final().iter().zip(banded.y_final()) {
        assert_relative_eq!(*a, *b, epsilon = 1e-6, max_relative = 1e-4);
    }

    // Five grouped evaluations per banded Jacobian instead of 80
    let dense_fd = dense.nfev as f64 / dense.njev as f64;
    let banded_fd = banded.nfev as f64 / banded.njev as f64;
    assert!(banded_fd < dense_fd);
    assert!(banded.nfev < dense.nfev);
}

#[test]
fn analytic_banded_jacobian_is_accepted() {
    let rhs = gray_scott(20);
    let y0 = gray_scott_initial(20);
    let opts = ODEOptions::with_tolerances(1e-6, 1e-9)
        .method(ODEMethod::SDIRK4)
        .banded_jacobian_fn(2, 2, |_t, y, jac: &mut BandedMatrix| {
            let cells = y.len() / 2;
            let inv_dx2 = (cells * cells) as f64;
            for i in 0..cells {
                let (u, v) = (y[2 * i], y[2 * i + 1]);
                let (ui, vi) = (2 * i, 2 * i + 1);
                jac.set(ui, ui, -2.0 * DU * inv_dx2 - v * v - F);
                jac.set(ui, vi, -2.0 * u * v);
                jac.set(vi, ui, v * v);
                jac.set(vi, vi, -2.0 * DV * inv_dx2 + 2.0 * u * v - (F + K));
                let left = if i == 0 { 1 } else { i - 1 };
                let right = if i + 1 == cells { cells - 2 } else { i + 1 };
                for nb in [left, right] {
                    let (un, vn) = (2 * nb, 2 * nb + 1);
                    jac.set(ui, un, jac.get(ui, un) + DU * inv_dx2);
                    jac.set(vi, vn, jac.get(vi, vn) + DV * inv_dx2);
                }
            }
        });
    let exact_jac = solve_ivp(rhs, [0.0, 5.0], &y0, &opts).unwrap();
    let fd_jac = solve_ivp(
        rhs,
        [0.0, 5.0],
        &y0,
        &ODEOptions::with_tolerances(1e-6, 1e-9)
            .method(ODEMethod::SDIRK4)
            .banded_jacobian(2, 2),
    )
    .unwrap();

    for (a, b) in exact_jac.y_final().iter().zip(fd_jac.y_final()) {
        assert_relative_eq!(*a, *b, epsilon = 1e-6, max_relative = 1e-4);
    }
    assert!(exact_jac.nfev < fd_jac.nfev);
}
