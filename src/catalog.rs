use std::sync::Arc;

use log::{info, warn};
use serde::{Deserialize, Serialize};
use snafu::{OptionExt, ensure};

use crate::error::{Result, UnknownDomainSnafu, UnknownTaskSnafu};
use crate::selector::SessionRequest;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Domain {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub domain_id: String,
    pub name: String,
}

/// Exam outline: the domains and the tasks under them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    pub domains: Vec<Domain>,
    pub tasks: Vec<Task>,
}

impl Catalog {
    pub fn domain(&self, id: &str) -> Option<&Domain> {
        self.domains.iter().find(|domain| domain.id == id)
    }

    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    pub fn tasks_in_domain<'a>(&'a self, domain_id: &'a str) -> impl Iterator<Item = &'a Task> {
        self.tasks
            .iter()
            .filter(move |task| task.domain_id == domain_id)
    }

    /// Rejects session filters that name content this catalog does not have.
    /// A task filter combined with a domain filter must belong to that domain.
    pub fn check_request(&self, request: &SessionRequest) -> Result<()> {
        if let Some(domain_id) = &request.domain_filter {
            self.domain(domain_id)
                .context(UnknownDomainSnafu { id: domain_id })?;
        }
        if let Some(task_id) = &request.task_filter {
            let task = self.task(task_id).context(UnknownTaskSnafu { id: task_id })?;
            if let Some(domain_id) = &request.domain_filter {
                ensure!(task.domain_id == *domain_id, UnknownTaskSnafu { id: task_id });
            }
        }
        Ok(())
    }
}

/// Where catalog contents come from, typically the content database.
pub trait ContentSource {
    fn load(&self) -> Result<Catalog>;
}

impl<F> ContentSource for F
where
    F: Fn() -> Result<Catalog>,
{
    fn load(&self) -> Result<Catalog> {
        self()
    }
}

/// Holds the catalog between sessions. Loaded on first use and kept until
/// [`ContentCache::invalidate`] or [`ContentCache::refresh`] is called.
pub struct ContentCache<S> {
    source: S,
    catalog: Option<Arc<Catalog>>,
}

impl<S: ContentSource> ContentCache<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            catalog: None,
        }
    }

    pub fn get(&mut self) -> Result<Arc<Catalog>> {
        match &self.catalog {
            Some(catalog) => Ok(Arc::clone(catalog)),
            None => self.refresh(),
        }
    }

    /// Reloads from the source. On failure the previously cached catalog, if
    /// any, stays in place.
    pub fn refresh(&mut self) -> Result<Arc<Catalog>> {
        let catalog = match self.source.load() {
            Ok(catalog) => Arc::new(catalog),
            Err(err) => {
                warn!("content catalog refresh failed: {err}");
                return Err(err);
            }
        };
        info!(
            "loaded content catalog: {} domains, {} tasks",
            catalog.domains.len(),
            catalog.tasks.len()
        );
        self.catalog = Some(Arc::clone(&catalog));
        Ok(catalog)
    }

    pub fn invalidate(&mut self) {
        self.catalog = None;
    }

    pub fn is_loaded(&self) -> bool {
        self.catalog.is_some()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::error::EngineError;

    fn outline() -> Catalog {
        Catalog {
            domains: vec![
                Domain {
                    id: "people".into(),
                    name: "People".into(),
                },
                Domain {
                    id: "process".into(),
                    name: "Process".into(),
                },
            ],
            tasks: vec![
                Task {
                    id: "conflict".into(),
                    domain_id: "people".into(),
                    name: "Manage conflict".into(),
                },
                Task {
                    id: "risk".into(),
                    domain_id: "process".into(),
                    name: "Assess and manage risks".into(),
                },
                Task {
                    id: "budget".into(),
                    domain_id: "process".into(),
                    name: "Plan and manage budget".into(),
                },
            ],
        }
    }

    #[test]
    fn lookups() {
        let catalog = outline();
        assert_eq!(catalog.domain("people").map(|d| d.name.as_str()), Some("People"));
        assert!(catalog.domain("business").is_none());
        let tasks: Vec<&str> = catalog
            .tasks_in_domain("process")
            .map(|t| t.id.as_str())
            .collect();
        assert_eq!(tasks, ["risk", "budget"]);
    }

    #[test]
    fn request_filters_are_checked() {
        let catalog = outline();
        assert_eq!(catalog.check_request(&SessionRequest::new(5)), Ok(()));
        assert_eq!(
            catalog.check_request(&SessionRequest::new(5).with_domain("process").with_task("risk")),
            Ok(())
        );
        assert_eq!(
            catalog.check_request(&SessionRequest::new(5).with_domain("business")),
            Err(EngineError::UnknownDomain {
                id: "business".into()
            })
        );
        assert_eq!(
            catalog.check_request(&SessionRequest::new(5).with_task("budgets")),
            Err(EngineError::UnknownTask {
                id: "budgets".into()
            })
        );
        assert_eq!(
            catalog.check_request(&SessionRequest::new(5).with_domain("people").with_task("risk")),
            Err(EngineError::UnknownTask { id: "risk".into() })
        );
    }

    #[test]
    fn loads_once_until_invalidated() -> Result<()> {
        let loads = Cell::new(0);
        let mut cache = ContentCache::new(|| -> Result<Catalog> {
            loads.set(loads.get() + 1);
            Ok(outline())
        });
        assert!(!cache.is_loaded());
        cache.get()?;
        cache.get()?;
        assert_eq!(loads.get(), 1);

        cache.invalidate();
        assert!(!cache.is_loaded());
        assert_eq!(cache.get()?.domains.len(), 2);
        assert_eq!(loads.get(), 2);

        cache.refresh()?;
        assert_eq!(loads.get(), 3);
        Ok(())
    }

    #[test]
    fn failed_refresh_keeps_previous_catalog() -> Result<()> {
        let healthy = Cell::new(true);
        let mut cache = ContentCache::new(|| -> Result<Catalog> {
            if healthy.get() {
                Ok(outline())
            } else {
                Err(EngineError::ContentUnavailable {
                    reason: "database offline".into(),
                })
            }
        });
        cache.get()?;
        healthy.set(false);
        assert!(cache.refresh().is_err());
        assert!(cache.is_loaded());
        assert_eq!(cache.get()?.tasks.len(), 3);
        Ok(())
    }

    #[test]
    fn failed_first_load_is_reported() {
        let mut cache = ContentCache::new(|| -> Result<Catalog> {
            Err(EngineError::ContentUnavailable {
                reason: "database offline".into(),
            })
        });
        assert!(matches!(
            cache.get(),
            Err(EngineError::ContentUnavailable { .. })
        ));
        assert!(!cache.is_loaded());
    }
}
