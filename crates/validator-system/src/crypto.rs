// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use crate::base_types::Address;
use crate::error::MetadataError;
use fastcrypto::traits::{KeyPair, Signer, ToFromBytes, VerifyingKey};
use fastcrypto::{bls12381, ed25519};
use rand::{rngs::StdRng, SeedableRng};

// Here we select the key schemes used throughout the engine. Metadata stores
// raw key bytes; the rest of the code base should only go through these
// aliases when it needs a parsed key.

/// Authority key signs checkpoints and certificates; validators prove ownership
/// of it with a proof of possession.
pub type AuthorityPublicKey = bls12381::min_sig::BLS12381PublicKey;
pub type AuthorityKeyPair = bls12381::min_sig::BLS12381KeyPair;
pub type AuthoritySignature = bls12381::min_sig::BLS12381Signature;

/// Network key authenticates peer connections.
pub type NetworkPublicKey = ed25519::Ed25519PublicKey;
pub type NetworkKeyPair = ed25519::Ed25519KeyPair;

/// Protocol key signs consensus blocks.
pub type ProtocolPublicKey = ed25519::Ed25519PublicKey;
pub type ProtocolKeyPair = ed25519::Ed25519KeyPair;

/// The message covered by a proof of possession: the authority key followed by
/// the address it is registered for.
fn proof_of_possession_message(authority_pubkey: &[u8], address: &Address) -> Vec<u8> {
    let mut msg = Vec::with_capacity(authority_pubkey.len() + address.as_ref().len());
    msg.extend_from_slice(authority_pubkey);
    msg.extend_from_slice(address.as_ref());
    msg
}

pub fn generate_proof_of_possession(keypair: &AuthorityKeyPair, address: &Address) -> Vec<u8> {
    let msg = proof_of_possession_message(keypair.public().as_bytes(), address);
    let signature: AuthoritySignature = keypair.sign(&msg);
    signature.as_bytes().to_vec()
}

pub fn verify_proof_of_possession(
    authority_pubkey: &AuthorityPublicKey,
    address: &Address,
    proof_of_possession: &[u8],
) -> Result<(), MetadataError> {
    let signature = AuthoritySignature::from_bytes(proof_of_possession)
        .map_err(|_| MetadataError::InvalidPop)?;
    let msg = proof_of_possession_message(authority_pubkey.as_bytes(), address);
    authority_pubkey
        .verify(&msg, &signature)
        .map_err(|_| MetadataError::InvalidPop)
}

/// The full key material of one validator, generated together.
pub struct ValidatorKeys {
    pub authority: AuthorityKeyPair,
    pub network: NetworkKeyPair,
    pub protocol: ProtocolKeyPair,
}

impl ValidatorKeys {
    pub fn generate(rng: &mut StdRng) -> Self {
        Self {
            authority: AuthorityKeyPair::generate(rng),
            network: NetworkKeyPair::generate(rng),
            protocol: ProtocolKeyPair::generate(rng),
        }
    }

    pub fn from_seed(seed: u64) -> Self {
        Self::generate(&mut StdRng::seed_from_u64(seed))
    }

    pub fn authority_pubkey_bytes(&self) -> Vec<u8> {
        self.authority.public().as_bytes().to_vec()
    }

    pub fn network_pubkey_bytes(&self) -> Vec<u8> {
        self.network.public().as_bytes().to_vec()
    }

    pub fn protocol_pubkey_bytes(&self) -> Vec<u8> {
        self.protocol.public().as_bytes().to_vec()
    }
}
