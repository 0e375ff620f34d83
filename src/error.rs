// Copyright 2024 Saptak Santra
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Error types

use std::fmt;

/// ECS error type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EcsError {
    /// Bad argument at a public boundary: zero component bytesize, an
    /// unknown pipeline/phase/system id, or the component cap already
    /// reached.
    InvalidArgument(&'static str),

    /// The entity id space is saturated; no id, fresh or recycled, is
    /// available.
    EntityExhausted,

    /// A growable array failed to grow (allocator failure). Fatal: the
    /// caller should treat the world as unusable.
    AllocationFailure,
}

impl fmt::Display for EcsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EcsError::InvalidArgument(msg) => write!(f, "invalid argument: {msg}"),
            EcsError::EntityExhausted => write!(f, "entity id space exhausted"),
            EcsError::AllocationFailure => write!(f, "allocation failure"),
        }
    }
}

impl std::error::Error for EcsError {}

/// Result type alias
pub type Result<T> = std::result::Result<T, EcsError>;
