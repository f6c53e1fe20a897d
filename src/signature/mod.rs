//! Atom and molecule signatures and their string forms.

mod encode;
pub use encode::*;

mod options;
pub use options::*;

mod atom;
pub use atom::*;

mod molecule;
pub use molecule::*;
