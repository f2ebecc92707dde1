//! Live feed assembler
//!
//! One background task owns the post subscription and the user search. It
//! reacts to three inputs:
//!
//! 1. a new snapshot of the post window
//! 2. a command from the view (`search`, `load_more`)
//! 3. a finished search
//!
//! and republishes a [`FeedView`] after each of them. Searches carry a
//! generation number; a result whose generation is no longer current is
//! dropped. Dropping the [`FeedAssembler`] aborts the task together with
//! any search it still runs.

use crate::config::FeedConfig;
use crate::state::{FeedState, FeedView, SearchState};
use async_trait::async_trait;
use document_store::{Direction, Query, QuerySnapshot, SharedStore, Subscription};
use social_service::domain::{fields, Paths, PostRecord, Record, UserSummary};
use social_service::profiles::normalize_term;
use social_service::{ProfileStore, WriteError, WriteResult};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, info, warn};

/// Keyword search over user profiles
#[async_trait]
pub trait UserSearch: Send + Sync {
    async fn search_users(&self, query: &str) -> WriteResult<Vec<UserSummary>>;
}

#[async_trait]
impl UserSearch for ProfileStore {
    async fn search_users(&self, query: &str) -> WriteResult<Vec<UserSummary>> {
        ProfileStore::search_users(self, query).await
    }
}

enum Command {
    Search(String),
    LoadMore,
}

type SearchOutput = (u64, WriteResult<Vec<UserSummary>>);

/// Newest posts first, at most `limit` of them
fn posts_window(limit: usize) -> Query {
    Query::new(Paths::posts())
        .order_by(fields::CREATED_AT, Direction::Descending)
        .limit(limit)
}

/// Handle to the running assembler task
pub struct FeedAssembler {
    commands: mpsc::UnboundedSender<Command>,
    view: watch::Receiver<FeedView>,
    task: JoinHandle<()>,
}

impl FeedAssembler {
    /// Subscribe to the first post window and start the assembler task
    ///
    /// Fails if the store refuses the initial subscription.
    pub async fn spawn(
        store: SharedStore,
        search: Arc<dyn UserSearch>,
        config: FeedConfig,
    ) -> WriteResult<Self> {
        let page_size = config.page_size.max(1);
        let subscription = store.subscribe(posts_window(page_size)).await?;

        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let (view_tx, view_rx) = watch::channel(FeedView::default());

        let mut driver = Driver {
            store,
            search_port: search,
            page_size,
            limit: page_size,
            window_len: 0,
            posts: Vec::new(),
            search: SearchState::default(),
            generation: 0,
            notice: None,
            view: view_tx,
        };
        driver.apply_snapshot(&subscription.current());
        driver.publish();

        let task = tokio::spawn(driver.run(subscription, commands_rx));
        info!(page_size, "Feed assembler started");

        Ok(Self {
            commands: commands_tx,
            view: view_rx,
            task,
        })
    }

    /// Search users by keyword; blank text clears the results
    pub fn search(&self, text: impl Into<String>) {
        self.send(Command::Search(text.into()));
    }

    /// Widen the post window by one page
    pub fn load_more(&self) {
        self.send(Command::LoadMore);
    }

    /// Latest published view
    pub fn view(&self) -> FeedView {
        self.view.borrow().clone()
    }

    /// Receiver that is notified on every republished view
    pub fn watch(&self) -> watch::Receiver<FeedView> {
        self.view.clone()
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    fn send(&self, command: Command) {
        if self.commands.send(command).is_err() {
            warn!("Feed assembler task is not running");
        }
    }
}

impl Drop for FeedAssembler {
    fn drop(&mut self) {
        self.task.abort();
    }
}

struct Driver {
    store: SharedStore,
    search_port: Arc<dyn UserSearch>,
    page_size: usize,
    limit: usize,
    /// Documents in the last window snapshot, including undecodable ones
    window_len: usize,
    posts: Vec<PostRecord>,
    search: SearchState,
    generation: u64,
    notice: Option<String>,
    view: watch::Sender<FeedView>,
}

impl Driver {
    async fn run(
        mut self,
        mut subscription: Subscription,
        mut commands: mpsc::UnboundedReceiver<Command>,
    ) {
        let mut searches: JoinSet<SearchOutput> = JoinSet::new();
        let mut live = true;

        loop {
            tokio::select! {
                snapshot = subscription.changed(), if live => match snapshot {
                    Some(snapshot) => self.apply_snapshot(&snapshot),
                    None => {
                        warn!("Post subscription closed by the store");
                        live = false;
                        continue;
                    }
                },
                command = commands.recv() => match command {
                    Some(Command::Search(text)) => self.start_search(&text, &mut searches),
                    Some(Command::LoadMore) => {
                        if let Some(wider) = self.widen().await {
                            subscription = wider;
                            live = true;
                        }
                    }
                    None => break,
                },
                Some(joined) = searches.join_next(), if !searches.is_empty() => match joined {
                    Ok((generation, result)) => self.finish_search(generation, result),
                    Err(e) if e.is_cancelled() => continue,
                    Err(e) => {
                        // only the current search can still be running
                        let generation = self.generation;
                        self.finish_search(
                            generation,
                            Err(WriteError::Network(format!("search task failed: {}", e))),
                        );
                    }
                },
            }
            self.publish();
        }

        debug!("Feed assembler stopped");
    }

    fn apply_snapshot(&mut self, snapshot: &QuerySnapshot) {
        let mut posts = Vec::with_capacity(snapshot.len());
        for doc in snapshot.iter() {
            match Record::from_snapshot(doc) {
                Ok(post) => posts.push(post),
                Err(e) => warn!(path = doc.path.as_str(), error = %e, "Skipping malformed post"),
            }
        }
        self.window_len = snapshot.len();
        self.posts = posts;
    }

    fn has_more(&self) -> bool {
        self.window_len >= self.limit
    }

    fn start_search(&mut self, text: &str, searches: &mut JoinSet<SearchOutput>) {
        self.generation += 1;
        searches.abort_all();
        self.notice = None;

        let query = normalize_term(text);
        if query.is_empty() {
            self.search = SearchState::default();
            return;
        }

        self.search = SearchState {
            query: query.clone(),
            in_flight: true,
            results: Vec::new(),
        };
        let generation = self.generation;
        let port = self.search_port.clone();
        searches.spawn(async move {
            let result = port.search_users(&query).await;
            (generation, result)
        });
    }

    fn finish_search(&mut self, generation: u64, result: WriteResult<Vec<UserSummary>>) {
        if generation != self.generation {
            debug!(generation, current = self.generation, "Dropping superseded search");
            return;
        }

        self.search.in_flight = false;
        match result {
            Ok(hits) => {
                debug!(query = %self.search.query, hits = hits.len(), "Search finished");
                self.search.results = hits;
            }
            Err(e) => {
                warn!(query = %self.search.query, error = %e, "User search failed");
                self.search.results.clear();
                self.notice = Some(e.to_string());
            }
        }
    }

    /// Resubscribe with a window one page larger
    ///
    /// No-op while the current window is not full.
    async fn widen(&mut self) -> Option<Subscription> {
        if !self.has_more() {
            return None;
        }

        let limit = self.limit + self.page_size;
        match self.store.subscribe(posts_window(limit)).await {
            Ok(subscription) => {
                self.limit = limit;
                self.apply_snapshot(&subscription.current());
                debug!(limit, "Feed window widened");
                Some(subscription)
            }
            Err(e) => {
                warn!(limit, error = %e, "Failed to widen feed window");
                self.notice = Some(WriteError::from(e).to_string());
                None
            }
        }
    }

    fn publish(&self) {
        let view = FeedView {
            state: FeedState::resolve(&self.search, &self.posts),
            notice: self.notice.clone(),
            has_more: self.has_more(),
        };
        self.view.send_if_modified(|current| {
            if *current == view {
                return false;
            }
            *current = view;
            true
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_posts_window_orders_newest_first() {
        let query = posts_window(5);
        assert_eq!(query.limit, Some(5));
        assert_eq!(query.collection.as_str(), "posts");
        assert_eq!(query.order_by.len(), 1);
        assert_eq!(query.order_by[0].field, fields::CREATED_AT);
        assert_eq!(query.order_by[0].direction, Direction::Descending);
    }
}
