// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use crate::base_types::Address;
use crate::error::{SystemError, SystemResult};
use crate::fp_ensure;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Reports filed by validators against their peers during the current epoch.
/// Maps each reportee to the set of validators that reported it.
#[derive(Debug, Serialize, Deserialize, Clone, Eq, PartialEq, Default)]
pub struct ValidatorReportRecords {
    records: BTreeMap<Address, BTreeSet<Address>>,
}

impl ValidatorReportRecords {
    /// Reporting the same reportee again is a no-op.
    pub fn report(&mut self, reporter: Address, reportee: Address) -> SystemResult {
        fp_ensure!(reporter != reportee, SystemError::CannotReportOneself);
        self.records.entry(reportee).or_default().insert(reporter);
        Ok(())
    }

    pub fn undo_report(&mut self, reporter: Address, reportee: Address) -> SystemResult {
        let reporters = self
            .records
            .get_mut(&reportee)
            .ok_or(SystemError::ReportRecordNotFound(reportee))?;
        fp_ensure!(
            reporters.remove(&reporter),
            SystemError::ReportRecordNotFound(reportee)
        );
        if reporters.is_empty() {
            self.records.remove(&reportee);
        }
        Ok(())
    }

    pub fn reporters_of(&self, reportee: &Address) -> BTreeSet<Address> {
        self.records.get(reportee).cloned().unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Address, &BTreeSet<Address>)> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Drops every record about the leaving validator and every report it filed.
    pub fn clean_leaving_validator(&mut self, leaving: &Address) {
        self.records.remove(leaving);
        self.records.retain(|_, reporters| {
            reporters.remove(leaving);
            !reporters.is_empty()
        });
    }
}
