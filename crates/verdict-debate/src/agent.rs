//! Bull and bear debate agents

use crate::case::CaseDraft;
use crate::rebuttal::{parse_drafts, resolve};
use crate::{Case, DebateConfig, DebateError, EmphasisProfile, Rebuttal, Result, Role, SharedData, prompts};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use verdict_core::ErrorKind;
use verdict_llm::{CompletionRequest, Message, ModelProvider, complete_json};

/// First draft plus one redraft
const MAX_DRAFT_ATTEMPTS: usize = 2;

/// One side of the debate
#[derive(Clone)]
pub struct DebateAgent {
    role: Role,
    provider: Arc<dyn ModelProvider>,
    model: String,
    max_tokens: usize,
    profile: EmphasisProfile,
    low_confidence_cap: f64,
}

impl DebateAgent {
    pub fn new(role: Role, provider: Arc<dyn ModelProvider>, model: impl Into<String>) -> Self {
        Self {
            role,
            provider,
            model: model.into(),
            max_tokens: 4096,
            profile: EmphasisProfile::for_role(role),
            low_confidence_cap: 0.3,
        }
    }

    /// Agent for a role with the configured model and profile
    pub fn from_config(role: Role, provider: Arc<dyn ModelProvider>, config: &DebateConfig) -> Self {
        let profile = match role {
            Role::Bull => config.bull_profile.clone(),
            Role::Bear => config.bear_profile.clone(),
        };
        Self::new(role, provider, &config.model)
            .with_max_tokens(config.max_tokens)
            .with_profile(profile)
            .with_low_confidence_cap(config.low_confidence_cap)
    }

    pub fn with_profile(mut self, profile: EmphasisProfile) -> Self {
        self.profile = profile;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_low_confidence_cap(mut self, cap: f64) -> Self {
        self.low_confidence_cap = cap;
        self
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// Draft this side's case from the shared data
    ///
    /// An invalid draft or one that concedes no weakness is redrafted once
    /// with the problem fed back. After that a weakness-free but otherwise
    /// valid draft becomes a low-confidence case; anything else becomes a
    /// degraded placeholder. Only model unavailability is an error.
    #[instrument(skip(self, shared), fields(role = %self.role, ticker = %shared.ticker))]
    pub async fn draft_case(&self, shared: &SharedData) -> Result<Case> {
        let ticker = shared.ticker.as_str();
        let stage = format!("{} drafting", self.role.as_str());
        let mut feedback: Option<String> = None;
        let mut unconceded: Option<CaseDraft> = None;

        for attempt in 1..=MAX_DRAFT_ATTEMPTS {
            let prompt = prompts::draft_prompt(self.role, &self.profile, shared, feedback.as_deref())?;
            let request = CompletionRequest::builder(&self.model)
                .system(prompts::system_prompt(self.role))
                .add_message(Message::user(prompt))
                .max_tokens(self.max_tokens)
                .temperature(0.4)
                .response_schema(prompts::case_schema(self.role))
                .purpose(format!("debate.{}.draft", self.role.as_str()))
                .build();

            let value: Value = match complete_json(self.provider.as_ref(), request).await {
                Ok(value) => value,
                Err(err) if err.is_unavailable() => return Err(DebateError::model(stage, err)),
                Err(err) => {
                    warn!(attempt, error = %err, "Draft unusable");
                    feedback = Some(format!("the answer could not be read ({err})"));
                    continue;
                }
            };

            let draft: CaseDraft = match serde_json::from_value(value) {
                Ok(draft) => draft,
                Err(err) => {
                    warn!(attempt, error = %err, "Draft does not match the case schema");
                    feedback = Some(format!("the answer does not match the case schema ({err})"));
                    continue;
                }
            };

            if let Some(problem) = draft.problem(self.role) {
                warn!(attempt, %problem, "Draft failed validation");
                feedback = Some(problem);
                continue;
            }

            if !draft.concedes_weakness() {
                warn!(attempt, "Draft conceded no weakness");
                feedback = Some("no weakness was conceded; name at least one point you cannot refute".to_string());
                unconceded = Some(draft);
                continue;
            }

            let case = draft.into_case(ticker, self.role);
            info!(attempt, claims = case.claims.len(), "Case drafted");
            return Ok(case);
        }

        if let Some(draft) = unconceded {
            info!("Falling back to a low-confidence case");
            return Ok(draft
                .into_case(ticker, self.role)
                .into_low_confidence(self.low_confidence_cap));
        }

        let reason = feedback.unwrap_or_else(|| "no valid draft".to_string());
        warn!(kind = %ErrorKind::DebateAgentFailure, %reason, "Case degraded after redraft");
        Ok(Case::degraded(ticker, self.role, &reason))
    }

    /// Rebut the opposing case once
    ///
    /// Unusable answers yield no rebuttals; only model unavailability is an
    /// error. Every returned rebuttal targets an opposing claim and is
    /// bounded by `own`'s weakest claim confidence.
    #[instrument(skip(self, opposing, own), fields(role = %self.role, targets = opposing.claims.len()))]
    pub async fn rebut(&self, opposing: &Case, own: &Case) -> Result<Vec<Rebuttal>> {
        if opposing.claims.is_empty() {
            debug!("Opposing case has no claims to rebut");
            return Ok(Vec::new());
        }

        let request = CompletionRequest::builder(&self.model)
            .system(prompts::system_prompt(self.role))
            .add_message(Message::user(prompts::rebuttal_prompt(opposing, own)?))
            .max_tokens(self.max_tokens)
            .temperature(0.3)
            .response_schema(prompts::rebuttal_schema())
            .purpose(format!("debate.{}.rebuttal", self.role.as_str()))
            .build();

        match complete_json::<Value>(self.provider.as_ref(), request).await {
            Ok(value) => {
                let rebuttals = resolve(parse_drafts(value), opposing, own);
                info!(count = rebuttals.len(), "Rebuttals issued");
                Ok(rebuttals)
            }
            Err(err) if err.is_unavailable() => Err(DebateError::model(
                format!("{} rebuttal", self.role.as_str()),
                err,
            )),
            Err(err) => {
                warn!(error = %err, "Rebuttal answer unusable, skipping");
                Ok(Vec::new())
            }
        }
    }
}

impl std::fmt::Debug for DebateAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DebateAgent")
            .field("role", &self.role)
            .field("provider", &self.provider.name())
            .field("model", &self.model)
            .finish()
    }
}
