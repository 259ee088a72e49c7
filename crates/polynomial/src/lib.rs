// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! # Polynomial Engine
//!
//! Dense polynomial arithmetic over a [`prio_field::Field`], with the two
//! evaluation strategies the validity protocol relies on.
//!
//! ## Client side
//!
//! [`fft`] and [`inverse_fft`] move between coefficients and evaluations on the
//! `n`-th roots of unity. Clients interpolate `f` and `g` on the `N`-th roots and
//! evaluate them on the `2N`-th roots to obtain the evaluations of `h = f * g`.
//!
//! ## Server side
//!
//! [`BatchPrecomp`] fixes a set of interpolation points and precomputes the
//! subproduct tree and barycentric weights once. [`PointPrecomp`] then binds an
//! evaluation point `x`, after which interpolating through the fixed points and
//! evaluating at `x` is a single inner product per polynomial.

mod batch;
mod errors;
mod fft;
mod point;
mod polynomial;

pub use batch::BatchPrecomp;
pub use errors::PolynomialError;
pub use fft::{evaluate_on_roots, fft, interpolate_on_roots, inverse_fft};
pub use point::PointPrecomp;
pub use polynomial::Polynomial;
