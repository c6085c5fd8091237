//! The four-phase run: extract, transform, load, report.

use crate::advisor::{self, GenerationParams};
use crate::clock::Clock;
use crate::extract;
use crate::llm::LlmClient;
use crate::model::User;
use crate::report::Report;
use crate::store;
use crate::users::UserSource;
use anyhow::Result;
use rand::Rng;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

const RULE: &str = "============================================================";

/// Where a run reads from and writes to.
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub id_column: String,
    pub output_dir: PathBuf,
    pub report_path: PathBuf,
    pub generation: GenerationParams,
}

/// What a completed run produced.
#[derive(Debug)]
pub struct RunOutcome {
    pub users: Vec<User>,
    pub loaded: usize,
    pub report: Report,
}

pub struct Pipeline<S, L, C, R> {
    users: S,
    llm: L,
    clock: C,
    rng: R,
    settings: RunSettings,
}

impl<S, L, C, R> Pipeline<S, L, C, R>
where
    S: UserSource,
    L: LlmClient,
    C: Clock,
    R: Rng,
{
    pub fn new(users: S, llm: L, clock: C, rng: R, settings: RunSettings) -> Self {
        Self {
            users,
            llm,
            clock,
            rng,
            settings,
        }
    }

    /// Fetch one user and attach a synthesized account; failures are logged and skipped.
    pub fn fetch_user(&mut self, id: i64) -> Option<User> {
        match self.users.fetch_user(id) {
            Ok(profile) => {
                let user = User::from_profile(profile, &mut self.rng);
                println!("User {}: {} loaded", id, user.name);
                Some(user)
            }
            Err(e) if e.is_not_found() => {
                warn!(user_id = e.user_id(), "{}", e);
                println!("User {} not found in the API", e.user_id());
                None
            }
            Err(e) => {
                warn!(user_id = e.user_id(), "{}", e);
                println!("Error fetching user {}: {}", e.user_id(), e);
                None
            }
        }
    }

    pub fn extract(&mut self, ids: &[i64]) -> Vec<User> {
        ids.iter().filter_map(|&id| self.fetch_user(id)).collect()
    }

    pub fn transform(&self, users: &mut [User]) {
        for user in users.iter_mut() {
            println!("\nProcessing: {}", user.name);
            let message = advisor::generate_message(&self.llm, user, &self.settings.generation);
            println!("Message: {}", message);
            user.ai_generated_message = Some(message);
        }
    }

    /// Returns how many records were written successfully.
    pub fn load(&self, users: &mut [User]) -> usize {
        let mut loaded = 0;
        for user in users.iter_mut() {
            let message = user.ai_generated_message.clone().unwrap_or_default();
            if store::update_user_data(&self.settings.output_dir, user, &message, &self.clock) {
                loaded += 1;
            }
        }
        loaded
    }

    pub fn report(&self, users: &[User]) -> Result<Report> {
        let report = Report::build(users, self.clock.now());
        report.write(&self.settings.report_path)?;
        println!("\nREPORT: {} users processed", report.total_users_processed);
        println!("Total messages: {}", report.total_messages_generated);
        Ok(report)
    }

    /// Run every phase over the ids in `input`.
    ///
    /// Returns `Ok(None)` without touching the network when no ids could be read.
    pub fn run(&mut self, input: &Path) -> Result<Option<RunOutcome>> {
        println!("{}", RULE);
        println!("SDW ETL - STARTING PIPELINE");
        println!("{}", RULE);

        println!("\nPHASE 1: EXTRACT");
        let ids = extract::extract_user_ids(input, &self.settings.id_column);
        if ids.is_empty() {
            println!("No ids found to process");
            info!(path = %input.display(), "nothing to process");
            return Ok(None);
        }

        let mut users = self.extract(&ids);
        println!("EXTRACT done: {} users loaded", users.len());
        info!(requested = ids.len(), fetched = users.len(), "extract phase finished");

        println!("\nPHASE 2: TRANSFORM");
        self.transform(&mut users);

        println!("\nPHASE 3: LOAD");
        let loaded = self.load(&mut users);
        info!(loaded, total = users.len(), "load phase finished");

        println!("\nPHASE 4: REPORT");
        let report = self.report(&users)?;

        println!("\n{}", RULE);
        println!("ETL PIPELINE FINISHED");
        println!("{}/{} users processed", loaded, users.len());
        println!(
            "Results are in '{}'",
            self.settings.output_dir.display()
        );
        println!("{}", RULE);

        Ok(Some(RunOutcome {
            users,
            loaded,
            report,
        }))
    }
}
