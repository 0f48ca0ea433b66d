//! SLOW tier: organization login-security policy and recent config churn.

use async_trait::async_trait;
use serde::Deserialize;

use crate::client::EndpointId;
use crate::error::{ErrorCategory, Result};
use crate::metrics::MetricHandle;
use crate::types::{MetricSample, Tier};

use super::{Collector, CollectorContext, CollectorFactory};

pub struct ConfigCollector;

inventory::submit! { CollectorFactory(|| Box::new(ConfigCollector)) }

#[derive(Deserialize, Default)]
struct LoginSecurity {
    #[serde(rename = "enforcePasswordExpiration", default)]
    enforce_password_expiration: bool,
    #[serde(rename = "passwordExpirationDays", default)]
    password_expiration_days: Option<u64>,
    #[serde(rename = "enforceDifferentPasswords", default)]
    enforce_different_passwords: bool,
    #[serde(rename = "numDifferentPasswords", default)]
    num_different_passwords: Option<u64>,
    #[serde(rename = "enforceAccountLockout", default)]
    enforce_account_lockout: bool,
    #[serde(rename = "accountLockoutAttempts", default)]
    account_lockout_attempts: Option<u64>,
    #[serde(rename = "enforceIdleTimeout", default)]
    enforce_idle_timeout: bool,
    #[serde(rename = "idleTimeoutMinutes", default)]
    idle_timeout_minutes: Option<u64>,
    #[serde(rename = "enforceTwoFactorAuth", default)]
    enforce_two_factor_auth: bool,
}

#[derive(Deserialize)]
struct ConfigurationChangeEntry {
    #[allow(dead_code)]
    #[serde(rename = "ts")]
    timestamp: String,
}

#[async_trait]
impl Collector for ConfigCollector {
    fn name(&self) -> &'static str {
        "config"
    }

    fn tier(&self) -> Tier {
        Tier::Slow
    }

    async fn collect(&self, ctx: &CollectorContext) -> Result<Vec<MetricSample>> {
        let mut samples = Vec::new();

        for org in ctx.inventory.organizations().await?.iter() {
            let path = format!("/organizations/{}/loginSecurity", org.id);
            super::track_api_call(self.name(), self.tier(), EndpointId::LoginSecurity.as_label());
            let policy: LoginSecurity =
                match ctx.client.get_json(&path, EndpointId::LoginSecurity).await {
                    Ok(p) => p,
                    Err(e) if e.category() == ErrorCategory::NotAvailable => continue,
                    Err(e) => {
                        super::isolate_error(self.name(), self.tier(), &e);
                        continue;
                    }
                };

            for (setting, enabled) in [
                ("password_expiration", policy.enforce_password_expiration),
                ("different_passwords", policy.enforce_different_passwords),
                ("account_lockout", policy.enforce_account_lockout),
                ("idle_timeout", policy.enforce_idle_timeout),
                ("two_factor_auth", policy.enforce_two_factor_auth),
            ] {
                samples.push(MetricSample::new(
                    MetricHandle::OrgLoginSecuritySetting,
                    vec![org.id.clone(), setting.to_string()],
                    enabled as u8 as f64,
                ));
            }

            for (setting, value) in [
                ("password_expiration_days", policy.password_expiration_days),
                ("num_different_passwords", policy.num_different_passwords),
                ("account_lockout_attempts", policy.account_lockout_attempts),
                ("idle_timeout_minutes", policy.idle_timeout_minutes),
            ] {
                if let Some(v) = value {
                    samples.push(MetricSample::new(
                        MetricHandle::OrgLoginSecurityThreshold,
                        vec![org.id.clone(), setting.to_string()],
                        v as f64,
                    ));
                }
            }

            let changes_path = format!(
                "/organizations/{}/configurationChanges?timespan=86400",
                org.id
            );
            super::track_api_call(self.name(), self.tier(), EndpointId::ConfigurationChanges.as_label());
            let changes: Vec<ConfigurationChangeEntry> = ctx
                .client
                .get_json_paginated(&changes_path, EndpointId::ConfigurationChanges)
                .await
                .unwrap_or_default();

            samples.push(MetricSample::new(
                MetricHandle::OrgConfigChanges24hTotal,
                vec![org.id.clone()],
                changes.len() as f64,
            ));
        }

        Ok(samples)
    }
}
