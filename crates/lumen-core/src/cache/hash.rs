// Copyright 2025 eraflo
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

//! Stable content hashing for cache keys.

use std::hash::{BuildHasher, Hash};

use ahash::RandomState;
use bytemuck::NoUninit;

// Fixed seeds keep keys identical across runs and threads.
const SEEDS: [u64; 4] = [
    0x243F_6A88_85A3_08D3,
    0x1319_8A2E_0370_7344,
    0xA409_3822_299F_31D0,
    0x082E_FA98_EC4E_6C89,
];

fn hasher() -> RandomState {
    RandomState::with_seeds(SEEDS[0], SEEDS[1], SEEDS[2], SEEDS[3])
}

/// Hashes a byte slice.
pub fn hash_bytes(bytes: &[u8]) -> u64 {
    BuildHasher::hash_one(&hasher(), bytes)
}

/// Hashes the byte image of a padding-free value.
pub fn hash_pod<T: NoUninit>(value: &T) -> u64 {
    hash_bytes(bytemuck::bytes_of(value))
}

/// Hashes any `Hash` value with the same fixed seeds.
pub fn hash_value<T: Hash + ?Sized>(value: &T) -> u64 {
    BuildHasher::hash_one(&hasher(), value)
}
