// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]
#![cfg_attr(not(any(test, feature = "std")), no_std)]

pub mod endpoint;
pub mod error;
pub mod frame;
pub mod settings;
pub mod state;
pub mod stream;
