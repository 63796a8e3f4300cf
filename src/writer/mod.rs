//! Output document writers.
//!
//! Each writer turns plain text (or images) into the bytes of one output
//! file. None of them touch the file system.

pub mod docx;
pub mod pdf;
pub mod pptx;
pub mod xlsx;
