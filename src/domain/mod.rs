pub mod answers;
pub mod financial;
pub mod issue;
pub mod pricing;
pub mod profile;
pub mod sizing;
pub mod trace;

pub use answers::*;
pub use financial::*;
pub use issue::*;
pub use pricing::*;
pub use profile::*;
pub use sizing::*;
pub use trace::*;
