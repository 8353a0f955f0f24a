// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use crate::event::SystemEvent;
use crate::governance::StakeReceipt;
use fastcrypto::hash::{Blake2b256, HashFunction};
use rand::Rng;
use serde::{de::Error as _, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

pub type EpochId = u64;

pub type StakeUnit = u64;

pub const ADDRESS_LENGTH: usize = 32;

const HEX_PREFIX: &str = "0x";

macro_rules! hex_bytes_type {
    ($name:ident) => {
        #[derive(Eq, PartialEq, Ord, PartialOrd, Copy, Clone, Hash, Default)]
        pub struct $name([u8; ADDRESS_LENGTH]);

        impl $name {
            pub const ZERO: Self = Self([0u8; ADDRESS_LENGTH]);

            pub const fn new(bytes: [u8; ADDRESS_LENGTH]) -> Self {
                Self(bytes)
            }

            pub const fn from_single_byte(byte: u8) -> Self {
                let mut bytes = [0u8; ADDRESS_LENGTH];
                bytes[ADDRESS_LENGTH - 1] = byte;
                Self(bytes)
            }

            pub fn random() -> Self {
                Self(rand::thread_rng().gen())
            }

            pub fn to_vec(&self) -> Vec<u8> {
                self.0.to_vec()
            }

            pub fn into_bytes(self) -> [u8; ADDRESS_LENGTH] {
                self.0
            }
        }

        impl AsRef<[u8]> for $name {
            fn as_ref(&self) -> &[u8] {
                &self.0[..]
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{HEX_PREFIX}{}", hex::encode(self.0))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{HEX_PREFIX}{}", hex::encode(self.0))
            }
        }

        impl FromStr for $name {
            type Err = hex::FromHexError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let s = s.strip_prefix(HEX_PREFIX).unwrap_or(s);
                // Accept short forms such as `0x5` by left padding.
                let padded = format!("{:0>width$}", s, width = ADDRESS_LENGTH * 2);
                let mut bytes = [0u8; ADDRESS_LENGTH];
                hex::decode_to_slice(padded, &mut bytes)?;
                Ok(Self(bytes))
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                if serializer.is_human_readable() {
                    serializer.serialize_str(&self.to_string())
                } else {
                    self.0.serialize(serializer)
                }
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                if deserializer.is_human_readable() {
                    let s = String::deserialize(deserializer)?;
                    Self::from_str(&s).map_err(D::Error::custom)
                } else {
                    Ok(Self(<[u8; ADDRESS_LENGTH]>::deserialize(deserializer)?))
                }
            }
        }
    };
}

hex_bytes_type!(Address);
hex_bytes_type!(ObjectID);
hex_bytes_type!(TransactionDigest);

/// The address the network itself uses to send system transactions.
pub const SYSTEM_ADDRESS: Address = Address::ZERO;

impl Address {
    /// Deterministic address for tests and tooling: the seed fills the last bytes.
    pub fn from_seed(seed: u64) -> Self {
        let mut bytes = [0u8; ADDRESS_LENGTH];
        bytes[ADDRESS_LENGTH - 8..].copy_from_slice(&seed.to_be_bytes());
        Self(bytes)
    }
}

impl ObjectID {
    /// Ids are derived from the creating transaction and a per-transaction counter.
    pub fn derive_id(digest: &TransactionDigest, creation_num: u64) -> Self {
        let mut hasher = Blake2b256::default();
        hasher.update(digest.as_ref());
        hasher.update(creation_num.to_le_bytes());
        Self(hasher.finalize().digest)
    }
}

impl TransactionDigest {
    pub const fn genesis() -> Self {
        Self::ZERO
    }
}

/// Per-call execution context. Carries the authenticated sender, derives fresh
/// object ids, and collects the events and stake transfers a call produces.
#[derive(Debug)]
pub struct TxContext {
    sender: Address,
    digest: TransactionDigest,
    ids_created: u64,
    events: Vec<SystemEvent>,
    transfers: Vec<(Address, StakeReceipt)>,
}

impl TxContext {
    pub fn new(sender: Address, digest: TransactionDigest) -> Self {
        Self {
            sender,
            digest,
            ids_created: 0,
            events: vec![],
            transfers: vec![],
        }
    }

    pub fn new_system(digest: TransactionDigest) -> Self {
        Self::new(SYSTEM_ADDRESS, digest)
    }

    pub fn new_for_testing(sender: Address) -> Self {
        Self::new(sender, TransactionDigest::random())
    }

    pub fn sender(&self) -> Address {
        self.sender
    }

    pub fn digest(&self) -> TransactionDigest {
        self.digest
    }

    pub fn fresh_id(&mut self) -> ObjectID {
        let id = ObjectID::derive_id(&self.digest, self.ids_created);
        self.ids_created += 1;
        id
    }

    pub fn emit(&mut self, event: impl Into<SystemEvent>) {
        self.events.push(event.into());
    }

    pub fn transfer(&mut self, receipt: StakeReceipt, recipient: Address) {
        self.transfers.push((recipient, receipt));
    }

    pub fn events(&self) -> &[SystemEvent] {
        &self.events
    }

    pub fn take_events(&mut self) -> Vec<SystemEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn take_transfers(&mut self) -> Vec<(Address, StakeReceipt)> {
        std::mem::take(&mut self.transfers)
    }

    /// Marks the current point so that a failed call can discard what it produced.
    pub(crate) fn checkpoint(&self) -> (usize, usize) {
        (self.events.len(), self.transfers.len())
    }

    pub(crate) fn rollback_to(&mut self, checkpoint: (usize, usize)) {
        self.events.truncate(checkpoint.0);
        self.transfers.truncate(checkpoint.1);
    }
}
