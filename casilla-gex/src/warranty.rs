use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use casilla_core::package::Package;

use crate::models::{GexQuote, PaymentOption, SignatureArtifact, WarrantySubmission};

/// Steps of the warranty attachment wizard, strictly linear
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WarrantyStep {
    Form,
    Policies,
    Signature,
    Payment,
    Success,
}

#[derive(Debug, thiserror::Error)]
pub enum WarrantyError {
    #[error("Package {0} already has an active protection policy")]
    PolicyAlreadyActive(Uuid),

    #[error("Declared value must be positive")]
    MissingDeclaredValue,

    #[error("Description is required")]
    MissingDescription,

    #[error("Policy text must be read to the end before accepting")]
    PolicyNotRead,

    #[error("Policies must be accepted to continue")]
    PoliciesNotAccepted,

    #[error("A captured signature is required to continue")]
    MissingSignature,

    #[error("No quote available for the entered value")]
    MissingQuote,

    #[error("Cannot {action} from the {step:?} step")]
    InvalidStep { step: WarrantyStep, action: String },
}

/// The multi-step commitment that attaches a GEX policy to one package.
///
/// `Form → Policies → Signature → Payment → Success`, each transition
/// guarded; `back` returns to the immediately preceding step only. The
/// flow owns nothing but its own state until the submission is accepted
/// downstream, so abandoning it leaves the package untouched.
#[derive(Debug, Clone)]
pub struct WarrantyFlow {
    package_id: Uuid,
    step: WarrantyStep,
    declared_value_usd: f64,
    description: String,
    policy_scrolled: bool,
    accepted_at: Option<DateTime<Utc>>,
    signature: Option<SignatureArtifact>,
    payment_option: PaymentOption,
    quote: Option<GexQuote>,
}

impl WarrantyFlow {
    /// Entry point. Re-entrancy guard: a package with an active policy
    /// cannot start the flow again.
    pub fn begin(package: &Package) -> Result<Self, WarrantyError> {
        if package.has_gex {
            return Err(WarrantyError::PolicyAlreadyActive(package.id));
        }
        Ok(Self {
            package_id: package.id,
            step: WarrantyStep::Form,
            declared_value_usd: 0.0,
            description: package.description.clone(),
            policy_scrolled: false,
            accepted_at: None,
            signature: None,
            payment_option: PaymentOption::PayWithShipment,
            quote: None,
        })
    }

    pub fn step(&self) -> WarrantyStep {
        self.step
    }

    pub fn declared_value_usd(&self) -> f64 {
        self.declared_value_usd
    }

    pub fn set_declared_value(&mut self, value_usd: f64) {
        self.declared_value_usd = value_usd;
        // The quote tracks the entered value; a stale one must never be
        // submitted.
        self.quote = None;
    }

    pub fn set_description(&mut self, description: String) {
        self.description = description;
    }

    /// Recorded when the policy text has been scrolled to its end.
    /// Until then the accept checkbox stays disabled.
    pub fn mark_policy_scrolled(&mut self) {
        self.policy_scrolled = true;
    }

    /// Accept the policies. Compliance requirement: only possible after
    /// the text was read to the end, and the acceptance timestamp is
    /// what the server later checks.
    pub fn accept_policies(&mut self) -> Result<(), WarrantyError> {
        if !self.policy_scrolled {
            return Err(WarrantyError::PolicyNotRead);
        }
        self.accepted_at = Some(Utc::now());
        Ok(())
    }

    pub fn set_signature(&mut self, signature: SignatureArtifact) {
        self.signature = Some(signature);
    }

    pub fn set_payment_option(&mut self, option: PaymentOption) {
        self.payment_option = option;
    }

    pub fn set_quote(&mut self, quote: GexQuote) {
        self.quote = Some(quote);
    }

    /// Advance to the next step if its guard passes. The transition
    /// table makes skipping ahead structurally impossible: there is no
    /// way to set the step from outside.
    pub fn advance(&mut self) -> Result<WarrantyStep, WarrantyError> {
        let next = match self.step {
            WarrantyStep::Form => {
                if !(self.declared_value_usd > 0.0) {
                    return Err(WarrantyError::MissingDeclaredValue);
                }
                if self.description.trim().is_empty() {
                    return Err(WarrantyError::MissingDescription);
                }
                WarrantyStep::Policies
            }
            WarrantyStep::Policies => {
                if !self.policy_scrolled {
                    return Err(WarrantyError::PolicyNotRead);
                }
                if self.accepted_at.is_none() {
                    return Err(WarrantyError::PoliciesNotAccepted);
                }
                WarrantyStep::Signature
            }
            WarrantyStep::Signature => {
                if self.signature.is_none() {
                    return Err(WarrantyError::MissingSignature);
                }
                WarrantyStep::Payment
            }
            WarrantyStep::Payment => {
                return Err(WarrantyError::InvalidStep {
                    step: self.step,
                    action: "advance; the payment step completes via submission".to_string(),
                })
            }
            WarrantyStep::Success => {
                return Err(WarrantyError::InvalidStep {
                    step: self.step,
                    action: "advance".to_string(),
                })
            }
        };
        self.step = next;
        Ok(next)
    }

    /// Return to the immediately preceding step. Entered data is kept.
    pub fn back(&mut self) -> Result<WarrantyStep, WarrantyError> {
        let previous = match self.step {
            WarrantyStep::Form | WarrantyStep::Success => {
                return Err(WarrantyError::InvalidStep {
                    step: self.step,
                    action: "go back".to_string(),
                })
            }
            WarrantyStep::Policies => WarrantyStep::Form,
            WarrantyStep::Signature => WarrantyStep::Policies,
            WarrantyStep::Payment => WarrantyStep::Signature,
        };
        self.step = previous;
        Ok(previous)
    }

    /// The payload submitted at the payment step. Only constructible
    /// once every guard upstream has passed, which is what lets the
    /// submission carry non-optional acceptance and signature.
    pub fn submission(&self) -> Result<WarrantySubmission, WarrantyError> {
        if self.step != WarrantyStep::Payment {
            return Err(WarrantyError::InvalidStep {
                step: self.step,
                action: "submit".to_string(),
            });
        }
        let quote = self.quote.clone().ok_or(WarrantyError::MissingQuote)?;
        let signature = self
            .signature
            .clone()
            .ok_or(WarrantyError::MissingSignature)?;
        let accepted_at = self.accepted_at.ok_or(WarrantyError::PoliciesNotAccepted)?;

        Ok(WarrantySubmission {
            package_id: self.package_id,
            declared_value_usd: self.declared_value_usd,
            quote,
            signature,
            payment_option: self.payment_option,
            accepted_at,
        })
    }

    /// Called after the submission was accepted downstream. A failed
    /// submission leaves the flow at the payment step with everything
    /// entered intact.
    pub fn complete(&mut self) -> Result<(), WarrantyError> {
        if self.step != WarrantyStep::Payment {
            return Err(WarrantyError::InvalidStep {
                step: self.step,
                action: "complete".to_string(),
            });
        }
        self.step = WarrantyStep::Success;
        Ok(())
    }
}
