// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use crate::balance::Balance;
use crate::base_types::{Address, EpochId, ObjectID, TxContext};
use crate::committee::CommitteeMember;
use crate::crypto::{
    verify_proof_of_possession, AuthorityPublicKey, NetworkPublicKey, ProtocolPublicKey,
};
use crate::error::{MetadataError, SystemError, SystemResult};
use crate::event::{StakingRequestEvent, UnstakingRequestEvent};
use crate::fp_ensure;
use crate::governance::StakeReceipt;
use crate::network_address::{parse_host_port, Transport};
use fastcrypto::traits::ToFromBytes;
use multiaddr::Multiaddr;
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::debug;

use super::staking_pool::StakingPoolV1;
use super::system_state_summary::ValidatorSummary;

pub const MAX_VALIDATOR_METADATA_LENGTH: usize = 256;

/// Max commission rate, in basis points.
pub const MAX_COMMISSION_RATE: u64 = 2_000;

/// Max gas price a validator can quote.
pub const MAX_VALIDATOR_GAS_PRICE: u64 = 100_000;

#[derive(Debug, Serialize, Deserialize, Clone, Eq, PartialEq)]
pub struct ValidatorMetadataV1 {
    pub address: Address,
    pub authority_pubkey_bytes: Vec<u8>,
    pub network_pubkey_bytes: Vec<u8>,
    pub protocol_pubkey_bytes: Vec<u8>,
    pub proof_of_possession: Vec<u8>,
    pub name: String,
    pub description: String,
    pub image_url: String,
    pub project_url: String,
    pub net_address: String,
    pub p2p_address: String,
    pub primary_address: String,
    pub next_epoch_authority_pubkey_bytes: Option<Vec<u8>>,
    pub next_epoch_proof_of_possession: Option<Vec<u8>>,
    pub next_epoch_network_pubkey_bytes: Option<Vec<u8>>,
    pub next_epoch_protocol_pubkey_bytes: Option<Vec<u8>>,
    pub next_epoch_net_address: Option<String>,
    pub next_epoch_p2p_address: Option<String>,
    pub next_epoch_primary_address: Option<String>,
}

#[derive(derive_more::Debug, Clone, Eq, PartialEq)]
pub struct VerifiedValidatorMetadataV1 {
    pub address: Address,
    pub authority_pubkey: AuthorityPublicKey,
    pub network_pubkey: NetworkPublicKey,
    pub protocol_pubkey: ProtocolPublicKey,
    #[debug(ignore)]
    pub proof_of_possession: Vec<u8>,
    pub name: String,
    pub net_address: Multiaddr,
    pub p2p_address: Multiaddr,
    pub primary_address: Multiaddr,
    pub next_epoch_authority_pubkey: Option<AuthorityPublicKey>,
    pub next_epoch_network_pubkey: Option<NetworkPublicKey>,
    pub next_epoch_protocol_pubkey: Option<ProtocolPublicKey>,
    pub next_epoch_net_address: Option<Multiaddr>,
    pub next_epoch_p2p_address: Option<Multiaddr>,
    pub next_epoch_primary_address: Option<Multiaddr>,
}

fn parse_authority_key(bytes: &[u8]) -> Result<AuthorityPublicKey, MetadataError> {
    AuthorityPublicKey::from_bytes(bytes).map_err(|_| MetadataError::InvalidAuthorityPubkey)
}

fn parse_network_key(bytes: &[u8]) -> Result<NetworkPublicKey, MetadataError> {
    NetworkPublicKey::from_bytes(bytes).map_err(|_| MetadataError::InvalidNetPubkey)
}

fn parse_protocol_key(bytes: &[u8]) -> Result<ProtocolPublicKey, MetadataError> {
    ProtocolPublicKey::from_bytes(bytes).map_err(|_| MetadataError::InvalidProtocolPubkey)
}

fn parse_address(
    addr: &str,
    transport: Transport,
    error: MetadataError,
) -> Result<Multiaddr, MetadataError> {
    parse_host_port(addr, transport).ok_or(error)
}

impl ValidatorMetadataV1 {
    /// Verify validator metadata and return a verified version (on success) or the
    /// first invalid field (on failure).
    pub fn verify(&self) -> Result<VerifiedValidatorMetadataV1, MetadataError> {
        let authority_pubkey = parse_authority_key(&self.authority_pubkey_bytes)?;
        verify_proof_of_possession(&authority_pubkey, &self.address, &self.proof_of_possession)?;

        let network_pubkey = parse_network_key(&self.network_pubkey_bytes)?;
        let protocol_pubkey = parse_protocol_key(&self.protocol_pubkey_bytes)?;

        let net_address =
            parse_address(&self.net_address, Transport::Tcp, MetadataError::InvalidNetAddr)?;
        let p2p_address =
            parse_address(&self.p2p_address, Transport::Udp, MetadataError::InvalidP2pAddr)?;
        let primary_address = parse_address(
            &self.primary_address,
            Transport::Udp,
            MetadataError::InvalidPrimaryAddr,
        )?;

        let next_epoch_authority_pubkey = self
            .next_epoch_authority_pubkey_bytes
            .as_deref()
            .map(parse_authority_key)
            .transpose()?;
        // A staged authority key always comes with its own proof of possession.
        if let Some(ref key) = next_epoch_authority_pubkey {
            let pop = self
                .next_epoch_proof_of_possession
                .as_deref()
                .ok_or(MetadataError::InvalidPop)?;
            verify_proof_of_possession(key, &self.address, pop)?;
        }

        let next_epoch_network_pubkey = self
            .next_epoch_network_pubkey_bytes
            .as_deref()
            .map(parse_network_key)
            .transpose()?;
        let next_epoch_protocol_pubkey = self
            .next_epoch_protocol_pubkey_bytes
            .as_deref()
            .map(parse_protocol_key)
            .transpose()?;

        let next_epoch_net_address = self
            .next_epoch_net_address
            .as_deref()
            .map(|a| parse_address(a, Transport::Tcp, MetadataError::InvalidNetAddr))
            .transpose()?;
        let next_epoch_p2p_address = self
            .next_epoch_p2p_address
            .as_deref()
            .map(|a| parse_address(a, Transport::Udp, MetadataError::InvalidP2pAddr))
            .transpose()?;
        let next_epoch_primary_address = self
            .next_epoch_primary_address
            .as_deref()
            .map(|a| parse_address(a, Transport::Udp, MetadataError::InvalidPrimaryAddr))
            .transpose()?;

        Ok(VerifiedValidatorMetadataV1 {
            address: self.address,
            authority_pubkey,
            network_pubkey,
            protocol_pubkey,
            proof_of_possession: self.proof_of_possession.clone(),
            name: self.name.clone(),
            net_address,
            p2p_address,
            primary_address,
            next_epoch_authority_pubkey,
            next_epoch_network_pubkey,
            next_epoch_protocol_pubkey,
            next_epoch_net_address,
            next_epoch_p2p_address,
            next_epoch_primary_address,
        })
    }

    fn check_lengths(&self) -> SystemResult {
        let fields = [
            ("name", self.name.len()),
            ("description", self.description.len()),
            ("image_url", self.image_url.len()),
            ("project_url", self.project_url.len()),
            ("net_address", self.net_address.len()),
            ("p2p_address", self.p2p_address.len()),
            ("primary_address", self.primary_address.len()),
        ];
        fields
            .into_iter()
            .try_for_each(|(field, length)| check_length(field, length))
    }

    /// Applies every staged value. Staged keys and addresses replace the live
    /// ones only here.
    fn effectuate_staged(&mut self) {
        if let Some(key) = self.next_epoch_authority_pubkey_bytes.take() {
            self.authority_pubkey_bytes = key;
            if let Some(pop) = self.next_epoch_proof_of_possession.take() {
                self.proof_of_possession = pop;
            }
        }
        if let Some(key) = self.next_epoch_network_pubkey_bytes.take() {
            self.network_pubkey_bytes = key;
        }
        if let Some(key) = self.next_epoch_protocol_pubkey_bytes.take() {
            self.protocol_pubkey_bytes = key;
        }
        if let Some(addr) = self.next_epoch_net_address.take() {
            self.net_address = addr;
        }
        if let Some(addr) = self.next_epoch_p2p_address.take() {
            self.p2p_address = addr;
        }
        if let Some(addr) = self.next_epoch_primary_address.take() {
            self.primary_address = addr;
        }
    }
}

fn check_length(field: &str, length: usize) -> SystemResult {
    fp_ensure!(
        length <= MAX_VALIDATOR_METADATA_LENGTH,
        SystemError::MetadataExceedingLengthLimit {
            field: field.to_string(),
            length,
            limit: MAX_VALIDATOR_METADATA_LENGTH,
        }
    );
    Ok(())
}

/// The capability a validator hands to whoever operates it. Only the cap whose
/// id is currently recorded on the validator is honored.
#[derive(Debug, Serialize, Deserialize, Clone, Eq, PartialEq)]
pub struct UnverifiedValidatorOperationCap {
    pub id: ObjectID,
    pub authorizer_validator_address: Address,
}

/// A cap that was checked against the validator it names.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct ValidatorOperationCap {
    pub(crate) authorizer_validator_address: Address,
}

impl ValidatorOperationCap {
    pub fn validator_address(&self) -> Address {
        self.authorizer_validator_address
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Eq, PartialEq)]
pub struct ValidatorV1 {
    metadata: ValidatorMetadataV1,
    #[serde(skip)]
    verified_metadata: OnceCell<VerifiedValidatorMetadataV1>,

    pub voting_power: u64,
    pub operation_cap_id: ObjectID,
    pub gas_price: u64,
    pub staking_pool: StakingPoolV1,
    pub commission_rate: u64,
    pub next_epoch_stake: u64,
    pub next_epoch_gas_price: u64,
    pub next_epoch_commission_rate: u64,
}

impl ValidatorV1 {
    /// Creates a candidate record and the operation cap that controls it.
    pub fn new(
        metadata: ValidatorMetadataV1,
        gas_price: u64,
        commission_rate: u64,
        ctx: &mut TxContext,
    ) -> SystemResult<(Self, UnverifiedValidatorOperationCap)> {
        metadata.check_lengths()?;
        check_commission_rate(commission_rate)?;
        check_gas_price(gas_price)?;
        metadata.verify()?;

        let address = metadata.address;
        let staking_pool = StakingPoolV1::new(ctx);
        let cap = UnverifiedValidatorOperationCap {
            id: ctx.fresh_id(),
            authorizer_validator_address: address,
        };
        let validator = Self {
            metadata,
            verified_metadata: OnceCell::new(),
            voting_power: 0,
            operation_cap_id: cap.id,
            gas_price,
            staking_pool,
            commission_rate,
            next_epoch_stake: 0,
            next_epoch_gas_price: gas_price,
            next_epoch_commission_rate: commission_rate,
        };
        Ok((validator, cap))
    }

    pub fn metadata(&self) -> &ValidatorMetadataV1 {
        &self.metadata
    }

    pub fn verified_metadata(&self) -> SystemResult<&VerifiedValidatorMetadataV1> {
        Ok(self
            .verified_metadata
            .get_or_try_init(|| self.metadata.verify())?)
    }

    pub fn address(&self) -> Address {
        self.metadata.address
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    pub fn staking_pool_id(&self) -> ObjectID {
        self.staking_pool.id
    }

    pub fn is_preactive(&self) -> bool {
        self.staking_pool.is_preactive()
    }

    /// Stake backing this validator in the current epoch.
    pub fn total_stake(&self) -> u64 {
        self.staking_pool.stake_balance
    }

    pub fn pending_stake_amount(&self) -> u64 {
        self.staking_pool.pending_stake
    }

    pub fn pending_stake_withdraw_amount(&self) -> u64 {
        self.staking_pool.pending_total_withdraw
    }

    pub fn request_add_stake(
        &mut self,
        stake: Balance,
        staker_address: Address,
        current_epoch: EpochId,
        ctx: &mut TxContext,
    ) -> SystemResult<StakeReceipt> {
        let amount = stake.value();
        fp_ensure!(amount > 0, SystemError::InvalidStakeAmount);
        let stake_epoch = current_epoch + 1;
        let receipt = self
            .staking_pool
            .request_add_stake(stake, stake_epoch, ctx)?;
        // Candidates have no exchange rate to protect yet.
        if self.staking_pool.is_preactive() {
            self.staking_pool.process_pending_stake()?;
        }
        self.next_epoch_stake = self
            .next_epoch_stake
            .checked_add(amount)
            .ok_or(SystemError::ArithmeticOverflow)?;
        debug!(validator = %self.address(), staker = %staker_address, amount, "Stake requested");
        ctx.emit(StakingRequestEvent {
            pool_id: self.staking_pool_id(),
            validator_address: self.address(),
            staker_address,
            epoch: current_epoch,
            amount,
        });
        Ok(receipt)
    }

    /// Genesis stake counts from epoch 0 and is processed right away.
    pub fn request_add_stake_at_genesis(
        &mut self,
        stake: Balance,
        ctx: &mut TxContext,
    ) -> SystemResult<StakeReceipt> {
        let amount = stake.value();
        fp_ensure!(amount > 0, SystemError::InvalidStakeAmount);
        let receipt = self.staking_pool.request_add_stake(stake, 0, ctx)?;
        self.staking_pool.process_pending_stake()?;
        self.next_epoch_stake = self
            .next_epoch_stake
            .checked_add(amount)
            .ok_or(SystemError::ArithmeticOverflow)?;
        Ok(receipt)
    }

    pub fn request_withdraw_stake(
        &mut self,
        receipt: StakeReceipt,
        staker_address: Address,
        current_epoch: EpochId,
        ctx: &mut TxContext,
    ) -> SystemResult<Balance> {
        let principal_amount = receipt.principal();
        let stake_activation_epoch = receipt.stake_activation_epoch();
        let withdrawn = self
            .staking_pool
            .request_withdraw_stake(receipt, current_epoch)?;
        let withdraw_amount = withdrawn.value();
        let reward_amount = withdraw_amount.saturating_sub(principal_amount);
        self.next_epoch_stake = self
            .next_epoch_stake
            .checked_sub(withdraw_amount)
            .ok_or(SystemError::ArithmeticOverflow)?;
        debug!(
            validator = %self.address(),
            staker = %staker_address,
            principal_amount,
            reward_amount,
            "Stake withdrawal requested"
        );
        ctx.emit(UnstakingRequestEvent {
            pool_id: self.staking_pool_id(),
            validator_address: self.address(),
            staker_address,
            stake_activation_epoch,
            unstaking_epoch: current_epoch,
            principal_amount,
            reward_amount,
        });
        Ok(withdrawn)
    }

    pub fn deposit_stake_rewards(&mut self, reward: Balance) -> SystemResult {
        self.next_epoch_stake = self
            .next_epoch_stake
            .checked_add(reward.value())
            .ok_or(SystemError::ArithmeticOverflow)?;
        self.staking_pool.deposit_rewards(reward)
    }

    /// Settles the pool for `new_epoch`; afterwards the pool must hold exactly
    /// the stake this record expects.
    pub fn process_pending_stakes_and_withdraws(&mut self, new_epoch: EpochId) -> SystemResult {
        self.staking_pool
            .process_pending_stakes_and_withdraws(new_epoch)?;
        fp_ensure!(
            self.total_stake() == self.next_epoch_stake,
            SystemError::StakeBalanceMismatch {
                validator: self.address(),
                pool_stake: self.total_stake(),
                next_epoch_stake: self.next_epoch_stake,
            }
        );
        Ok(())
    }

    pub fn adjust_stake_and_gas_price(&mut self) {
        self.gas_price = self.next_epoch_gas_price;
        self.commission_rate = self.next_epoch_commission_rate;
    }

    pub fn activate(&mut self, activation_epoch: EpochId) -> SystemResult {
        self.staking_pool.activate(activation_epoch)
    }

    pub fn deactivate(&mut self, deactivation_epoch: EpochId) -> SystemResult {
        self.voting_power = 0;
        self.staking_pool.deactivate(deactivation_epoch)
    }

    pub fn new_operation_cap(&mut self, ctx: &mut TxContext) -> UnverifiedValidatorOperationCap {
        let cap = UnverifiedValidatorOperationCap {
            id: ctx.fresh_id(),
            authorizer_validator_address: self.address(),
        };
        self.operation_cap_id = cap.id;
        cap
    }

    fn check_cap(&self, cap: &ValidatorOperationCap) -> SystemResult {
        fp_ensure!(
            cap.authorizer_validator_address == self.address(),
            SystemError::InvalidOperationCap(self.operation_cap_id)
        );
        Ok(())
    }

    fn ensure_preactive(&self) -> SystemResult {
        fp_ensure!(
            self.is_preactive(),
            SystemError::ValidatorNotPreactive(self.address())
        );
        Ok(())
    }

    pub fn request_set_gas_price(
        &mut self,
        cap: &ValidatorOperationCap,
        new_price: u64,
    ) -> SystemResult {
        check_gas_price(new_price)?;
        self.check_cap(cap)?;
        self.next_epoch_gas_price = new_price;
        Ok(())
    }

    pub fn set_candidate_gas_price(
        &mut self,
        cap: &ValidatorOperationCap,
        new_price: u64,
    ) -> SystemResult {
        self.ensure_preactive()?;
        check_gas_price(new_price)?;
        self.check_cap(cap)?;
        self.next_epoch_gas_price = new_price;
        self.gas_price = new_price;
        Ok(())
    }

    pub fn request_set_commission_rate(&mut self, new_rate: u64) -> SystemResult {
        check_commission_rate(new_rate)?;
        self.next_epoch_commission_rate = new_rate;
        Ok(())
    }

    pub fn set_candidate_commission_rate(&mut self, new_rate: u64) -> SystemResult {
        self.ensure_preactive()?;
        check_commission_rate(new_rate)?;
        self.next_epoch_commission_rate = new_rate;
        self.commission_rate = new_rate;
        Ok(())
    }

    /// Runs `update` against a copy of the metadata and keeps the result only if
    /// it still verifies.
    fn update_metadata(
        &mut self,
        update: impl FnOnce(&mut ValidatorMetadataV1),
    ) -> SystemResult {
        let mut metadata = self.metadata.clone();
        update(&mut metadata);
        metadata.verify()?;
        self.metadata = metadata;
        self.verified_metadata = OnceCell::new();
        Ok(())
    }

    pub fn update_name(&mut self, name: String) -> SystemResult {
        check_length("name", name.len())?;
        self.metadata.name = name;
        self.verified_metadata = OnceCell::new();
        Ok(())
    }

    pub fn update_description(&mut self, description: String) -> SystemResult {
        check_length("description", description.len())?;
        self.metadata.description = description;
        Ok(())
    }

    pub fn update_image_url(&mut self, image_url: String) -> SystemResult {
        check_length("image_url", image_url.len())?;
        self.metadata.image_url = image_url;
        Ok(())
    }

    pub fn update_project_url(&mut self, project_url: String) -> SystemResult {
        check_length("project_url", project_url.len())?;
        self.metadata.project_url = project_url;
        Ok(())
    }

    pub fn update_next_epoch_network_address(&mut self, net_address: String) -> SystemResult {
        check_length("net_address", net_address.len())?;
        self.update_metadata(|m| m.next_epoch_net_address = Some(net_address))
    }

    pub fn update_candidate_network_address(&mut self, net_address: String) -> SystemResult {
        self.ensure_preactive()?;
        check_length("net_address", net_address.len())?;
        self.update_metadata(|m| m.net_address = net_address)
    }

    pub fn update_next_epoch_p2p_address(&mut self, p2p_address: String) -> SystemResult {
        check_length("p2p_address", p2p_address.len())?;
        self.update_metadata(|m| m.next_epoch_p2p_address = Some(p2p_address))
    }

    pub fn update_candidate_p2p_address(&mut self, p2p_address: String) -> SystemResult {
        self.ensure_preactive()?;
        check_length("p2p_address", p2p_address.len())?;
        self.update_metadata(|m| m.p2p_address = p2p_address)
    }

    pub fn update_next_epoch_primary_address(&mut self, primary_address: String) -> SystemResult {
        check_length("primary_address", primary_address.len())?;
        self.update_metadata(|m| m.next_epoch_primary_address = Some(primary_address))
    }

    pub fn update_candidate_primary_address(&mut self, primary_address: String) -> SystemResult {
        self.ensure_preactive()?;
        check_length("primary_address", primary_address.len())?;
        self.update_metadata(|m| m.primary_address = primary_address)
    }

    pub fn update_next_epoch_authority_pubkey(
        &mut self,
        authority_pubkey: Vec<u8>,
        proof_of_possession: Vec<u8>,
    ) -> SystemResult {
        self.update_metadata(|m| {
            m.next_epoch_authority_pubkey_bytes = Some(authority_pubkey);
            m.next_epoch_proof_of_possession = Some(proof_of_possession);
        })
    }

    pub fn update_candidate_authority_pubkey(
        &mut self,
        authority_pubkey: Vec<u8>,
        proof_of_possession: Vec<u8>,
    ) -> SystemResult {
        self.ensure_preactive()?;
        self.update_metadata(|m| {
            m.authority_pubkey_bytes = authority_pubkey;
            m.proof_of_possession = proof_of_possession;
        })
    }

    pub fn update_next_epoch_network_pubkey(&mut self, network_pubkey: Vec<u8>) -> SystemResult {
        self.update_metadata(|m| m.next_epoch_network_pubkey_bytes = Some(network_pubkey))
    }

    pub fn update_candidate_network_pubkey(&mut self, network_pubkey: Vec<u8>) -> SystemResult {
        self.ensure_preactive()?;
        self.update_metadata(|m| m.network_pubkey_bytes = network_pubkey)
    }

    pub fn update_next_epoch_protocol_pubkey(&mut self, protocol_pubkey: Vec<u8>) -> SystemResult {
        self.update_metadata(|m| m.next_epoch_protocol_pubkey_bytes = Some(protocol_pubkey))
    }

    pub fn update_candidate_protocol_pubkey(&mut self, protocol_pubkey: Vec<u8>) -> SystemResult {
        self.ensure_preactive()?;
        self.update_metadata(|m| m.protocol_pubkey_bytes = protocol_pubkey)
    }

    pub fn effectuate_staged_metadata(&mut self) {
        self.metadata.effectuate_staged();
        self.verified_metadata = OnceCell::new();
    }

    /// Whether the two validators share any identifying field, comparing live
    /// values with live values, staged with staged, and each side's staged
    /// values with the other side's live ones.
    pub fn is_duplicate(&self, other: &ValidatorV1) -> bool {
        let (a, b) = (&self.metadata, &other.metadata);
        a.address == b.address
            || a.name == b.name
            || a.net_address == b.net_address
            || a.p2p_address == b.p2p_address
            || a.authority_pubkey_bytes == b.authority_pubkey_bytes
            || a.network_pubkey_bytes == b.network_pubkey_bytes
            || a.protocol_pubkey_bytes == b.protocol_pubkey_bytes
            || staged_collides(a, b)
            || staged_collides(b, a)
            || is_equal_some(&a.next_epoch_net_address, &b.next_epoch_net_address)
            || is_equal_some(&a.next_epoch_p2p_address, &b.next_epoch_p2p_address)
            || is_equal_some(
                &a.next_epoch_authority_pubkey_bytes,
                &b.next_epoch_authority_pubkey_bytes,
            )
            || is_equal_some(
                &a.next_epoch_network_pubkey_bytes,
                &b.next_epoch_network_pubkey_bytes,
            )
            || is_equal_some(
                &a.next_epoch_protocol_pubkey_bytes,
                &b.next_epoch_protocol_pubkey_bytes,
            )
    }

    /// Total order used for committee selection: stake, then authority key bytes.
    pub fn is_smaller_than(&self, other: &ValidatorV1) -> bool {
        self.cmp_by_stake(other) == Ordering::Less
    }

    pub(crate) fn cmp_by_stake(&self, other: &ValidatorV1) -> Ordering {
        self.total_stake()
            .cmp(&other.total_stake())
            .then_with(|| {
                self.metadata
                    .authority_pubkey_bytes
                    .cmp(&other.metadata.authority_pubkey_bytes)
            })
    }

    pub fn to_committee_member(&self) -> CommitteeMember {
        CommitteeMember {
            address: self.address(),
            voting_power: self.voting_power,
            authority_pubkey_bytes: self.metadata.authority_pubkey_bytes.clone(),
            network_pubkey_bytes: self.metadata.network_pubkey_bytes.clone(),
            protocol_pubkey_bytes: self.metadata.protocol_pubkey_bytes.clone(),
            net_address: self.metadata.net_address.clone(),
            p2p_address: self.metadata.p2p_address.clone(),
            primary_address: self.metadata.primary_address.clone(),
        }
    }

    pub fn to_validator_summary(&self) -> ValidatorSummary {
        let ValidatorMetadataV1 {
            address,
            authority_pubkey_bytes,
            network_pubkey_bytes,
            protocol_pubkey_bytes,
            proof_of_possession,
            name,
            description,
            image_url,
            project_url,
            net_address,
            p2p_address,
            primary_address,
            next_epoch_authority_pubkey_bytes,
            next_epoch_proof_of_possession,
            next_epoch_network_pubkey_bytes,
            next_epoch_protocol_pubkey_bytes,
            next_epoch_net_address,
            next_epoch_p2p_address,
            next_epoch_primary_address,
        } = self.metadata.clone();
        let pool = &self.staking_pool;
        ValidatorSummary {
            address,
            authority_pubkey_bytes,
            network_pubkey_bytes,
            protocol_pubkey_bytes,
            proof_of_possession,
            name,
            description,
            image_url,
            project_url,
            net_address,
            p2p_address,
            primary_address,
            next_epoch_authority_pubkey_bytes,
            next_epoch_proof_of_possession,
            next_epoch_network_pubkey_bytes,
            next_epoch_protocol_pubkey_bytes,
            next_epoch_net_address,
            next_epoch_p2p_address,
            next_epoch_primary_address,
            voting_power: self.voting_power,
            operation_cap_id: self.operation_cap_id,
            gas_price: self.gas_price,
            commission_rate: self.commission_rate,
            next_epoch_stake: self.next_epoch_stake,
            next_epoch_gas_price: self.next_epoch_gas_price,
            next_epoch_commission_rate: self.next_epoch_commission_rate,
            staking_pool_id: pool.id,
            staking_pool_activation_epoch: pool.activation_epoch,
            staking_pool_deactivation_epoch: pool.deactivation_epoch,
            staking_pool_balance: pool.stake_balance,
            rewards_pool: pool.rewards_pool.value(),
            pool_token_balance: pool.pool_token_balance,
            pending_stake: pool.pending_stake,
            pending_total_withdraw: pool.pending_total_withdraw,
            pending_pool_token_withdraw: pool.pending_pool_token_withdraw,
            exchange_rates_size: pool.exchange_rates.len() as u64,
        }
    }
}

fn staged_collides(a: &ValidatorMetadataV1, b: &ValidatorMetadataV1) -> bool {
    is_equal_some_and_value(&a.next_epoch_net_address, &b.net_address)
        || is_equal_some_and_value(&a.next_epoch_p2p_address, &b.p2p_address)
        || is_equal_some_and_value(
            &a.next_epoch_authority_pubkey_bytes,
            &b.authority_pubkey_bytes,
        )
        || is_equal_some_and_value(&a.next_epoch_network_pubkey_bytes, &b.network_pubkey_bytes)
        || is_equal_some_and_value(
            &a.next_epoch_protocol_pubkey_bytes,
            &b.protocol_pubkey_bytes,
        )
}

fn is_equal_some<T: PartialEq>(a: &Option<T>, b: &Option<T>) -> bool {
    matches!((a, b), (Some(a), Some(b)) if a == b)
}

fn is_equal_some_and_value<T: PartialEq>(a: &Option<T>, b: &T) -> bool {
    a.as_ref() == Some(b)
}

pub(crate) fn check_commission_rate(rate: u64) -> SystemResult {
    fp_ensure!(
        rate <= MAX_COMMISSION_RATE,
        SystemError::CommissionRateTooHigh {
            rate,
            max: MAX_COMMISSION_RATE,
        }
    );
    Ok(())
}

pub(crate) fn check_gas_price(gas_price: u64) -> SystemResult {
    fp_ensure!(
        gas_price <= MAX_VALIDATOR_GAS_PRICE,
        SystemError::GasPriceHigherThanThreshold {
            gas_price,
            max: MAX_VALIDATOR_GAS_PRICE,
        }
    );
    Ok(())
}

#[cfg(test)]
#[path = "../unit_tests/validator_tests.rs"]
mod validator_tests;
