//! Graph operators.
//!
//! - **Subdivision**: triangle 1→4 midpoint split, quad split around face
//!   centers ([`subdivide`])
//! - **Quadification**: random greedy merge of triangle pairs ([`quadify`])
//! - **Relaxation**: squarification, Laplacian smoothing and spherical
//!   projection ([`relax`])
//! - **Lifting**: pulling vertices onto the target sphere ([`sphere`])
//!
//! Every operator pass takes `&mut Graph` and either succeeds completely or
//! returns an error with the graph unchanged. Options are validated before
//! any pass runs; repeated subdivision is atomic per pass.

pub mod progress;
pub mod quadify;
pub mod relax;
pub mod sphere;
pub mod subdivide;

pub use progress::Progress;
pub use quadify::{quadification, quadification_seeded, QuadifyReport};
pub use relax::{laplacian, relax, squarification, RelaxOptions, RelaxReport};
pub use sphere::{lift, project_to_sphere, LiftMode};
pub use subdivide::{subdivide, subdivide_quad, SubdivideOptions, SubdivideReport};
