//! # Oracle Node Harness
//!
//! A single oracle node driven block by block, with a set of validators that
//! hold real secp256k1 keys so vote extensions are signed and verified the
//! same way a live commit would be.

use k256::ecdsa::signature::Signer;
use k256::ecdsa::{Signature, SigningKey};
use qc_18_oracle::abci::{
    vote_extension_sign_bytes, BlockIdFlag, CommitValidator, ExtendedCommitInfo,
    ExtendedVoteInfo, RequestFinalizeBlock, RequestPrepareProposal, RequestProcessProposal,
    Status,
};
use qc_18_oracle::domain::{
    AccAddress, ConsAddress, Decimal, ExchangeRateTuple, OracleVoteExtension, ValAddress,
};
use qc_18_oracle::ports::ValidatorInfo;
use qc_18_oracle::{
    FeederConfig, FeederHandle, InMemoryBankKeeper, InMemoryEventBus, InMemoryKVStore,
    InMemoryStakingKeeper, K256ExtensionVerifier, KeeperDependencies, OracleApp,
    OracleAppDependencies, OracleConfig, OracleError, OracleKeeper, OracleResult, Params,
    StaticPriceFeeder,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

pub const CHAIN_ID: &str = "qc-oracle-it";
pub const POWER_REDUCTION: u128 = 1_000_000;
pub const AUTHORITY: AccAddress = AccAddress::new([0xAA; 20]);

/// Salt used by every commit-reveal vote in the suite.
pub fn salt(n: u8) -> String {
    format!("{:02x}", n).repeat(32)
}

pub struct Validator {
    pub operator: ValAddress,
    pub cons: ConsAddress,
    pub key: SigningKey,
    pub power: i64,
}

impl Validator {
    pub fn new(n: u8, power: i64) -> Self {
        Self {
            operator: ValAddress::new([n; 20]),
            cons: ConsAddress::new([n.wrapping_add(0x80); 20]),
            key: SigningKey::from_slice(&[n; 32]).expect("valid scalar"),
            power,
        }
    }

    /// The validator's own account, its default feeder.
    pub fn account(&self) -> AccAddress {
        AccAddress::new(*self.operator.as_bytes())
    }

    pub fn info(&self) -> ValidatorInfo {
        ValidatorInfo {
            operator: self.operator,
            cons_address: self.cons,
            consensus_pubkey: self
                .key
                .verifying_key()
                .to_encoded_point(true)
                .as_bytes()
                .to_vec(),
            tokens: self.power as u128 * POWER_REDUCTION,
            bonded: true,
            jailed: false,
        }
    }

    /// Signed precommit of `commit_height` carrying `rates` (none: empty extension).
    pub fn extended_vote(&self, commit_height: u64, rates: &[(&str, Decimal)]) -> ExtendedVoteInfo {
        let vote_extension = if rates.is_empty() {
            Vec::new()
        } else {
            qc_18_oracle::abci::encode_frame(&OracleVoteExtension {
                height: commit_height,
                exchange_rates: rates
                    .iter()
                    .map(|(d, r)| ExchangeRateTuple::new(*d, *r))
                    .collect(),
            })
            .expect("encode extension")
        };
        let sign_bytes = vote_extension_sign_bytes(commit_height, 0, CHAIN_ID, &vote_extension)
            .expect("sign bytes");
        let signature: Signature = self.key.sign(&sign_bytes);

        ExtendedVoteInfo {
            validator: CommitValidator {
                address: self.cons,
                power: self.power,
            },
            vote_extension,
            extension_signature: signature.to_bytes().to_vec(),
            block_id_flag: BlockIdFlag::Commit,
        }
    }
}

pub struct OracleNode {
    pub app: OracleApp<InMemoryKVStore>,
    pub validators: Vec<Validator>,
    pub staking: Arc<InMemoryStakingKeeper>,
    pub bank: Arc<InMemoryBankKeeper>,
    pub events: Arc<InMemoryEventBus>,
    pub feeder: Arc<StaticPriceFeeder>,
}

pub struct NodeOptions {
    pub powers: Vec<i64>,
    pub vote_extensions_enable_height: u64,
    pub runtime: Option<tokio::runtime::Handle>,
    pub params: Params,
}

impl Default for NodeOptions {
    fn default() -> Self {
        Self {
            powers: vec![10, 20, 30],
            vote_extensions_enable_height: 1,
            runtime: None,
            params: Params::default(),
        }
    }
}

impl OracleNode {
    pub fn new(powers: &[i64]) -> Self {
        Self::with_options(NodeOptions {
            powers: powers.to_vec(),
            ..NodeOptions::default()
        })
    }

    pub fn with_options(options: NodeOptions) -> Self {
        let staking = Arc::new(InMemoryStakingKeeper::with_power_reduction(POWER_REDUCTION));
        let validators: Vec<Validator> = options
            .powers
            .iter()
            .enumerate()
            .map(|(i, p)| Validator::new(i as u8 + 1, *p))
            .collect();
        for v in &validators {
            staking.upsert(v.info());
        }

        let bank = Arc::new(InMemoryBankKeeper::new());
        let events = Arc::new(InMemoryEventBus::new());
        let mut keeper = OracleKeeper::new(KeeperDependencies {
            store: InMemoryKVStore::new(),
            staking: staking.clone(),
            bank: bank.clone(),
            event_bus: events.clone(),
            authority: AUTHORITY,
        });
        keeper.set_params(&options.params).expect("valid params");

        let feeder_config = FeederConfig {
            enable: options.runtime.is_some(),
            config_path: Some(PathBuf::from("price-feeder.toml")),
            log_level: "info".into(),
            tick_timeout: Duration::from_millis(200),
        };
        let feeder = Arc::new(StaticPriceFeeder::default());
        let handle = options
            .runtime
            .map(|rt| FeederHandle::new(feeder.clone(), feeder_config.clone(), rt));

        let config = OracleConfig {
            feeder: feeder_config,
            vote_extensions_enable_height: options.vote_extensions_enable_height,
            chain_id: CHAIN_ID.into(),
            authority: AUTHORITY,
            ..OracleConfig::default()
        };

        let app = OracleApp::new(OracleAppDependencies {
            keeper,
            config,
            feeder: handle,
            verifier: Arc::new(K256ExtensionVerifier),
        });

        Self {
            app,
            validators,
            staking,
            bank,
            events,
            feeder,
        }
    }

    pub fn validator(&self, n: usize) -> &Validator {
        &self.validators[n - 1]
    }

    /// Extended commit of `commit_height`; validator `i` reports `rates[i]`.
    pub fn extended_commit(&self, commit_height: u64, rates: &[&[(&str, Decimal)]]) -> ExtendedCommitInfo {
        ExtendedCommitInfo {
            round: 0,
            votes: self
                .validators
                .iter()
                .zip(rates)
                .map(|(v, r)| v.extended_vote(commit_height, r))
                .collect(),
        }
    }

    /// PreBlock then EndBlock for `height` with `txs`.
    pub fn finalize_block(&mut self, height: u64, txs: Vec<Vec<u8>>) -> OracleResult<()> {
        self.app.pre_block(&RequestFinalizeBlock { height, txs })?;
        self.app.end_block(height)
    }

    pub fn finalize_empty_blocks(&mut self, heights: std::ops::RangeInclusive<u64>) -> OracleResult<()> {
        for height in heights {
            self.finalize_block(height, Vec::new())?;
        }
        Ok(())
    }

    /// Full vote-extension round for `height`: the previous commit carries
    /// `rates`, this node proposes, accepts its own proposal and finalizes.
    pub fn vote_extension_block(&mut self, height: u64, rates: &[&[(&str, Decimal)]]) -> OracleResult<()> {
        let commit = self.extended_commit(height - 1, rates);
        let prepared = self.app.prepare_proposal(&RequestPrepareProposal {
            height,
            txs: Vec::new(),
            local_last_commit: commit,
        })?;

        let verdict = self.app.process_proposal(&RequestProcessProposal {
            height,
            txs: prepared.txs.clone(),
        });
        if verdict.status != Status::Accept {
            return Err(OracleError::InvalidVoteExtension(format!(
                "own proposal rejected at height {height}"
            )));
        }

        self.finalize_block(height, prepared.txs)
    }
}
