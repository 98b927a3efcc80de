// crates/core/src/panel.rs
//! Observer over one context at a time.
//!
//! A panel learns about its context's job through two independent paths
//! that write the same watch value: the change subscription, and an
//! explicit read when it attaches. Either alone is enough; a read result
//! never overwrites a notification that already arrived.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::watch;

use crate::error::RequestError;
use crate::jobs::{JobTicket, JobView};
use crate::lifecycle::is_post_url;
use crate::notify::{ChangeNotifier, Subscription};
use crate::service::SummaryService;

/// What the panel is showing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelView {
    /// Not attached to any context.
    Detached,
    /// The attached context is not showing a post.
    NotPost,
    Job(JobView),
}

pub struct Panel {
    service: SummaryService,
    notifier: ChangeNotifier,
    key: Option<String>,
    subscription: Option<Subscription>,
    view: Arc<watch::Sender<PanelView>>,
    /// Bumped on every attach so late deliveries for an old key are ignored.
    epoch: Arc<AtomicU64>,
}

impl Panel {
    pub fn new(service: SummaryService) -> Self {
        let notifier = ChangeNotifier::new(service.cache().clone());
        let (view, _) = watch::channel(PanelView::Detached);
        Self {
            service,
            notifier,
            key: None,
            subscription: None,
            view: Arc::new(view),
            epoch: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn watch(&self) -> watch::Receiver<PanelView> {
        self.view.subscribe()
    }

    pub fn view(&self) -> PanelView {
        self.view.borrow().clone()
    }

    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    /// Point the panel at context `key`, currently showing `url`.
    ///
    /// Replaces any previous subscription, then reads the cache so a result
    /// written while no panel was listening still shows up.
    pub async fn attach(&mut self, key: &str, url: &str) -> Result<(), RequestError> {
        let epoch = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;
        self.subscription = None;

        if !is_post_url(url) {
            self.key = None;
            self.view.send_replace(PanelView::NotPost);
            return Ok(());
        }

        self.key = Some(key.to_string());
        self.view.send_replace(PanelView::Job(JobView::Idle));

        let notified = Arc::new(AtomicBool::new(false));
        let subscription = {
            let view = Arc::clone(&self.view);
            let current_epoch = Arc::clone(&self.epoch);
            let notified = Arc::clone(&notified);
            self.notifier.subscribe(key, move |job| {
                view.send_if_modified(|shown| {
                    if current_epoch.load(Ordering::SeqCst) != epoch {
                        return false;
                    }
                    notified.store(true, Ordering::SeqCst);
                    *shown = PanelView::Job(job);
                    true
                });
            })
        };
        self.subscription = Some(subscription);

        let polled = self.service.cache().read_job(key).await?;
        self.view.send_if_modified(|shown| {
            if self.epoch.load(Ordering::SeqCst) != epoch || notified.load(Ordering::SeqCst) {
                return false;
            }
            *shown = PanelView::Job(polled);
            true
        });

        tracing::debug!(key = %key, "panel attached");
        Ok(())
    }

    /// Stop observing.
    pub fn detach(&mut self) {
        self.epoch.fetch_add(1, Ordering::SeqCst);
        self.subscription = None;
        self.key = None;
        self.view.send_replace(PanelView::Detached);
    }

    /// Start a summary of the attached post.
    ///
    /// The outcome arrives through [`Panel::watch`], not the return value.
    pub async fn request_summary(&self) -> Result<JobTicket, RequestError> {
        let key = self.key.as_deref().ok_or(RequestError::NotAttached)?;
        let busy = matches!(&*self.view.borrow(), PanelView::Job(job) if job.is_busy());
        if busy {
            return Err(RequestError::Busy);
        }
        self.service.summarize_context(key).await
    }
}
