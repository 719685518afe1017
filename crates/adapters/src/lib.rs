// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Adapters for the three external collaborators treated as
//! black boxes: the NWB conversion library, the NWB validator, and the
//! language-model provider. Only their contracts matter to the rest of the
//! workspace — these are the traits plus concrete (subprocess/HTTP) and
//! fake (test-support) implementations.

pub mod checksum;
pub mod conversion;
pub mod format_detect;
pub mod llm;
pub mod validation;

pub use checksum::sha256_file;
pub use conversion::{ConversionError, ConversionLibrary, ConversionRequest, SubprocessConversionLibrary};
pub use format_detect::{detect_format_rule_based, format_tag_for_filename, DetectedFormat};
pub use llm::{HttpLlmClient, LlmClient, LlmError, LlmRequest, NullLlmClient};
pub use validation::{NwbValidator, SubprocessNwbValidator, ValidationError};

#[cfg(any(test, feature = "test-support"))]
pub use conversion::FakeConversionLibrary;
#[cfg(any(test, feature = "test-support"))]
pub use llm::FakeLlmClient;
#[cfg(any(test, feature = "test-support"))]
pub use validation::FakeNwbValidator;
