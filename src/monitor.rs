use std::future::Future;

use anyhow::{Context, Result};
use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::api::{FetchError, StatsProvider};
use crate::config::MonitorConfig;
use crate::engine::{diff, new_matches};
use crate::extractor::StatsExtractor;
use crate::message;
use crate::notifier::Notifier;
use crate::reporter;
use crate::state::SnapshotStore;
use crate::types::{DetectedEvent, PlayerHandle, PlayerSnapshot};

/// Why a player's stored snapshot was left untouched this cycle.
#[derive(Debug, Error)]
pub enum PollFailure {
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),
    #[error("profile has no aggregate stats")]
    NoStats,
}

/// Result of polling one player.
#[derive(Debug)]
pub enum PollOutcome {
    /// Snapshot replaced after diffing against the previous one.
    Updated { changes: usize, new_matches: usize },
    /// Snapshot stored with nothing to compare against.
    Baseline,
    /// Previous snapshot retained.
    Retained(PollFailure),
}

/// Poll-diff-notify loop over a fixed, ordered set of players.
pub struct Monitor<P, N> {
    config: MonitorConfig,
    provider: P,
    notifier: N,
    extractor: StatsExtractor,
    store: SnapshotStore,
    /// Players that resolved at startup, in configured order.
    players: Vec<PlayerHandle>,
    last_status: Instant,
}

impl<P: StatsProvider, N: Notifier> Monitor<P, N> {
    pub fn new(config: MonitorConfig, provider: P, notifier: N) -> Self {
        let extractor = StatsExtractor::new(
            &config.aggregate_region,
            config.season_rule(),
            config.track_matches,
        );
        Self {
            config,
            provider,
            notifier,
            extractor,
            store: SnapshotStore::new(),
            players: Vec::new(),
            last_status: Instant::now(),
        }
    }

    pub fn players(&self) -> &[PlayerHandle] {
        &self.players
    }

    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    /// Collect the initial snapshot of every configured player and announce start.
    ///
    /// Players whose profile cannot be resolved are dropped for the rest of the
    /// process. Failing to post the banner is fatal.
    pub async fn startup(&mut self) -> Result<()> {
        let configured = self.config.players.clone();
        info!("Collecting initial stats for {} player(s)...", configured.len());

        self.players.clear();
        for (idx, player) in configured.iter().enumerate() {
            if idx > 0 {
                self.pause_between_players().await;
            }
            match self.fetch_snapshot(player).await {
                Ok(snapshot) => {
                    info!("[{player}] Tracking {} mode(s)", snapshot.modes.len());
                    self.store.put(player, snapshot);
                    self.players.push(player.clone());
                }
                Err(e) => {
                    warn!("[{player}] {e}. This player will be ignored");
                }
            }
        }

        if self.store.is_empty() {
            anyhow::bail!("none of the configured players could be resolved");
        }
        info!("Collected {} baseline snapshot(s)", self.store.len());

        self.notifier
            .send(&self.config.channel, &message::startup_banner(&self.players))
            .await
            .context("failed to post startup message")?;
        self.last_status = Instant::now();
        Ok(())
    }

    /// Startup, then poll until `shutdown` resolves.
    pub async fn run<F>(&mut self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        self.startup().await?;

        info!(
            "Entering polling loop (interval: {}s). Press Ctrl+C to stop.",
            self.config.poll_interval.as_secs()
        );
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutdown signal received");
                    break;
                }
                _ = self.tick() => {}
            }
        }
        Ok(())
    }

    async fn tick(&mut self) {
        tokio::time::sleep(self.config.poll_interval).await;
        self.poll_cycle().await;
        if self.status_due() {
            self.report_status().await;
        }
    }

    /// Visit every monitored player once, in order.
    pub async fn poll_cycle(&mut self) -> Vec<PollOutcome> {
        let players = self.players.clone();
        let mut outcomes = Vec::with_capacity(players.len());
        for (idx, player) in players.iter().enumerate() {
            if idx > 0 {
                self.pause_between_players().await;
            }
            outcomes.push(self.poll_player(player).await);
        }

        let changed = outcomes
            .iter()
            .filter(|o| {
                matches!(o, PollOutcome::Updated { changes, new_matches: found } if changes + found > 0)
            })
            .count();
        if changed == 0 {
            info!("No new stats");
        } else {
            info!("Detected changes for {changed} player(s)");
        }
        outcomes
    }

    /// Fetch, extract, diff, notify, then commit the new snapshot.
    pub async fn poll_player(&mut self, player: &str) -> PollOutcome {
        let mut snapshot = match self.fetch_snapshot(player).await {
            Ok(s) => s,
            Err(e) => {
                warn!("[{player}] {e}; keeping previous snapshot");
                return PollOutcome::Retained(e);
            }
        };

        let Some(old) = self.store.get(player) else {
            info!("[{player}] No previous snapshot, storing baseline");
            self.store.put(player, snapshot);
            return PollOutcome::Baseline;
        };

        // A profile without history keeps the previous one as the baseline
        if self.config.track_matches && snapshot.matches.is_empty() && !old.matches.is_empty() {
            debug!("[{player}] No match history in profile, keeping previous");
            snapshot.matches = old.matches.clone();
        }

        let changes = diff(old, &snapshot, player);
        let matches = if self.config.track_matches {
            new_matches(old, &snapshot, player)
        } else {
            Vec::new()
        };

        for event in &changes {
            info!(
                "[{player}] {}: wins {:?} kills {:?}",
                event.mode,
                event.wins.map(|c| c.delta),
                event.kills.map(|c| c.delta)
            );
            self.notify(&message::change(event)).await;
            reporter::report_event(DetectedEvent::CounterIncrease(event.clone()));
        }
        for event in &matches {
            info!("[{player}] New match {}", event.summary.id);
            self.notify(&message::new_match(event)).await;
            reporter::report_event(DetectedEvent::NewMatch(event.clone()));
        }

        self.store.put(player, snapshot);
        PollOutcome::Updated {
            changes: changes.len(),
            new_matches: matches.len(),
        }
    }

    /// Post the current snapshot of every monitored player.
    pub async fn report_status(&mut self) {
        self.last_status = Instant::now();
        self.notify(&message::status_header()).await;
        for player in &self.players {
            if let Some(snapshot) = self.store.get(player) {
                self.notify(&message::player_status(player, snapshot)).await;
            }
        }
    }

    fn status_due(&self) -> bool {
        self.config
            .status_interval
            .is_some_and(|every| self.last_status.elapsed() >= every)
    }

    async fn fetch_snapshot(&self, player: &str) -> Result<PlayerSnapshot, PollFailure> {
        let doc = self.provider.fetch(player).await?;
        self.extractor.extract(&doc).ok_or(PollFailure::NoStats)
    }

    async fn notify(&self, text: &str) {
        if let Err(e) = self.notifier.send(&self.config.channel, text).await {
            warn!("Failed to post to {}: {e}", self.config.channel);
        }
    }

    async fn pause_between_players(&self) {
        if !self.config.player_delay.is_zero() {
            tokio::time::sleep(self.config.player_delay).await;
        }
    }
}
