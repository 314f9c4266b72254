pub mod normalization;

pub use normalization::{
    Calibration, InputRanges, NormalizationRange, OutputDomain, OutputRanges, ScalarKind,
    ScalarReading,
};
