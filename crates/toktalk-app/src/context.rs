use std::sync::Arc;

use tokio::sync::{watch, RwLock};

use toktalk_persist::{CrossTabNotifier, RequestStore, SharedRequests};
use toktalk_types::{CounselingRequest, ValidationError};

use crate::error::AppError;
use crate::launch::LaunchUrl;

/// What kind of tab this is, decided once at startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchContext {
    /// Opened from a student link; the class comes from the URL and cannot change
    StudentOnly { class_name: String },
    /// Opened without a class; the teacher's own roster
    Teacher,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Student,
    Teacher,
}

/// Everything a tab knows, built once from the launch URL and the stored snapshot
pub struct AppContext {
    launch: LaunchContext,
    view: View,
    active_class: Option<String>,
    store: RequestStore,
    requests: SharedRequests,
    notifier: CrossTabNotifier,
}

impl AppContext {
    pub async fn from_launch(url: &LaunchUrl, store: RequestStore) -> Result<Self, AppError> {
        let snapshot = store.snapshot().await?;

        let (launch, view, active_class) = match url.class_param() {
            Some(class_name) => (
                LaunchContext::StudentOnly { class_name: class_name.clone() },
                View::Student,
                Some(class_name),
            ),
            None => (LaunchContext::Teacher, View::Teacher, snapshot.active_class),
        };

        tracing::info!(
            student_only = matches!(launch, LaunchContext::StudentOnly { .. }),
            class = active_class.as_deref().unwrap_or("-"),
            stored_requests = snapshot.requests.len(),
            "app context ready"
        );

        let requests = Arc::new(RwLock::new(snapshot.requests));
        let notifier = CrossTabNotifier::spawn(&store, Arc::clone(&requests));

        Ok(Self {
            launch,
            view,
            active_class,
            store,
            requests,
            notifier,
        })
    }

    pub fn launch(&self) -> &LaunchContext {
        &self.launch
    }

    pub fn is_student_only(&self) -> bool {
        matches!(self.launch, LaunchContext::StudentOnly { .. })
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn active_class(&self) -> Option<&str> {
        self.active_class.as_deref()
    }

    /// Teacher tabs toggle between the dashboard and a student preview once a class exists
    pub fn switch_view(&mut self, view: View) -> Result<(), AppError> {
        if view == self.view {
            return Ok(());
        }
        if self.is_student_only() {
            return Err(AppError::StudentOnly);
        }
        if self.active_class.is_none() {
            return Err(AppError::NoActiveClass);
        }
        self.view = view;
        Ok(())
    }

    /// Teacher setup: remember the class for this and later teacher tabs
    pub async fn set_class(&mut self, name: &str) -> Result<(), AppError> {
        if self.is_student_only() {
            return Err(AppError::StudentOnly);
        }
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::MissingClassName.into());
        }

        self.store.save_active_class(name).await?;
        self.active_class = Some(name.to_string());
        tracing::info!(class = %name, "active class set");
        Ok(())
    }

    /// Put a new request at the front and overwrite the stored list
    pub async fn record_request(&self, request: CounselingRequest) -> Result<(), AppError> {
        let snapshot = {
            let mut requests = self.requests.write().await;
            requests.insert(0, request);
            requests.clone()
        };
        self.store.save_requests(&snapshot).await?;
        Ok(())
    }

    /// Every class's requests, most recent first
    pub async fn requests(&self) -> Vec<CounselingRequest> {
        self.requests.read().await.clone()
    }

    pub async fn requests_for_active_class(&self) -> Vec<CounselingRequest> {
        let Some(class_name) = self.active_class.as_deref() else {
            return Vec::new();
        };
        self.requests
            .read()
            .await
            .iter()
            .filter(|request| request.class_name == class_name)
            .cloned()
            .collect()
    }

    /// Ticks whenever another tab replaces the request list
    pub fn changes(&self) -> watch::Receiver<u64> {
        self.notifier.changes()
    }

    pub fn store(&self) -> &RequestStore {
        &self.store
    }
}
