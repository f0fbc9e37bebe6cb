//! Output writers: the engine assembly tables, a statistics report and the
//! binary project format.
pub mod asm;
pub mod ctm;
pub mod report;
