//! Ready-to-render (`.rtr`) scene containers: a relocatable binary layout that
//! is memory-mapped and read in place, plus a glTF converter that writes it.

/// Container layout, arena writer, builders, validation, and glTF import.
pub mod rtr;
