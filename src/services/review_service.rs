use crate::dto::application_dto::{ActionOutcome, ApplicationQuery, ReviewAction};
use crate::dto::review_dto::{
    BucketCounts, CandidateOverview, CandidateQuery, CandidateRow, SeekerApplicationRow,
    SeekerOverview, StatusCounts,
};
use crate::error::{Error, Result};
use crate::models::application::{Application, ApplicationStatus, RelevanceBadge, RelevanceBucket};
use crate::models::message::EmployerMessage;
use crate::services::backend_client::BackendClient;

const CANDIDATES_PAGE: i64 = 100;

/// Conjunction of the candidate page's status tab, relevance and tag filters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReviewFilter {
    pub status: Option<ApplicationStatus>,
    pub bucket: Option<RelevanceBucket>,
    pub tag: Option<String>,
}

impl ReviewFilter {
    pub fn from_query(query: &CandidateQuery) -> Result<Self> {
        let status = selected(query.status.as_deref())
            .map(|s| s.parse::<ApplicationStatus>())
            .transpose()
            .map_err(Error::BadRequest)?;
        let bucket = selected(query.relevance.as_deref())
            .map(|s| s.parse::<RelevanceBucket>())
            .transpose()
            .map_err(Error::BadRequest)?;
        let tag = selected(query.tag.as_deref()).map(str::to_string);
        Ok(Self {
            status,
            bucket,
            tag,
        })
    }

    pub fn matches(&self, application: &Application) -> bool {
        if let Some(status) = self.status {
            if application.status != status {
                return false;
            }
        }
        if let Some(bucket) = self.bucket {
            if application.relevance_bucket() != bucket {
                return false;
            }
        }
        if let Some(tag) = &self.tag {
            if !application.rejection_tags().iter().any(|t| t == tag) {
                return false;
            }
        }
        true
    }
}

/// `None` for the "all" tab and for absent filters.
fn selected(value: Option<&str>) -> Option<&str> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case("all"))
}

pub fn status_counts(applications: &[Application]) -> StatusCounts {
    let mut counts = StatusCounts {
        all: applications.len(),
        ..Default::default()
    };
    for app in applications {
        match app.status {
            ApplicationStatus::Pending => counts.pending += 1,
            ApplicationStatus::Reviewed => counts.reviewed += 1,
            ApplicationStatus::Accepted => counts.accepted += 1,
            ApplicationStatus::Rejected => counts.rejected += 1,
        }
    }
    counts
}

pub fn bucket_counts(applications: &[Application]) -> BucketCounts {
    let mut counts = BucketCounts::default();
    for app in applications {
        match app.relevance_bucket() {
            RelevanceBucket::High => counts.high += 1,
            RelevanceBucket::Medium => counts.medium += 1,
            RelevanceBucket::Low => counts.low += 1,
        }
    }
    counts
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionPlan {
    /// The application is already decided; report its status and touch nothing.
    Keep(ApplicationStatus),
    Apply(ApplicationStatus),
}

pub fn plan_action(current: ApplicationStatus, action: ReviewAction) -> Result<ActionPlan> {
    if current.is_terminal() {
        return Ok(ActionPlan::Keep(current));
    }
    let target = action.target_status();
    if !current.can_transition_to(target) {
        return Err(Error::Conflict(format!(
            "Cannot move application from {} to {}",
            current, target
        )));
    }
    Ok(ActionPlan::Apply(target))
}

#[derive(Clone)]
pub struct ReviewService {
    client: BackendClient,
}

impl ReviewService {
    pub fn new(client: BackendClient) -> Self {
        Self { client }
    }

    pub async fn candidates(&self, vacancy_id: i64, query: &CandidateQuery) -> Result<CandidateOverview> {
        let filter = ReviewFilter::from_query(query)?;
        let vacancy = self.client.get_vacancy(vacancy_id).await?;
        let applications = self
            .client
            .list_applications(&ApplicationQuery {
                vacancy_id: Some(vacancy_id),
                per_page: Some(CANDIDATES_PAGE),
                ..Default::default()
            })
            .await?
            .applications;

        let counts = status_counts(&applications);
        let buckets = bucket_counts(&applications);
        let candidates = applications
            .into_iter()
            .filter(|app| filter.matches(app))
            .map(|application| CandidateRow {
                badge: RelevanceBadge::for_score(application.relevance_score),
                application,
            })
            .collect();

        Ok(CandidateOverview {
            vacancy,
            candidates,
            counts,
            buckets,
        })
    }

    /// Applies an employer decision. Decided applications are left alone.
    pub async fn act(
        &self,
        application_id: i64,
        action: ReviewAction,
        message: Option<String>,
    ) -> Result<ActionOutcome> {
        let application = self.client.get_application(application_id).await?;
        let (status, changed, message) = match plan_action(application.status, action)? {
            ActionPlan::Keep(current) => {
                tracing::info!(
                    application_id,
                    status = %current,
                    "Ignoring {:?} on an already decided application",
                    action
                );
                (
                    current,
                    false,
                    format!("Application is already {}", current),
                )
            }
            ActionPlan::Apply(_) => {
                let receipt = self
                    .client
                    .application_action(application_id, action, message)
                    .await?;
                tracing::info!(application_id, status = %receipt.status, "Application action applied");
                (receipt.status, true, receipt.message)
            }
        };

        let thread = if status == ApplicationStatus::Accepted {
            self.thread_or_empty(application_id).await
        } else {
            Vec::new()
        };

        Ok(ActionOutcome {
            application_id,
            status,
            changed,
            message,
            thread,
        })
    }

    pub async fn seeker_overview(&self, job_seeker_id: i64) -> Result<SeekerOverview> {
        let applications = self
            .client
            .list_applications(&ApplicationQuery {
                job_seeker_id: Some(job_seeker_id),
                ..Default::default()
            })
            .await?
            .applications;
        let counts = status_counts(&applications);

        let mut rows = Vec::with_capacity(applications.len());
        for mut application in applications {
            if application.vacancy.is_none() {
                match self.client.get_vacancy(application.vacancy_id).await {
                    Ok(vacancy) => application.vacancy = Some(vacancy),
                    Err(e) => tracing::warn!(
                        vacancy_id = application.vacancy_id,
                        "Failed to load vacancy for application: {}",
                        e
                    ),
                }
            }
            let message_count = if application.status.is_terminal() {
                self.thread_or_empty(application.id).await.len()
            } else {
                0
            };
            rows.push(SeekerApplicationRow {
                application,
                message_count,
            });
        }

        Ok(SeekerOverview {
            applications: rows,
            counts,
        })
    }

    async fn thread_or_empty(&self, application_id: i64) -> Vec<EmployerMessage> {
        match self.client.employer_thread(application_id).await {
            Ok(messages) => messages,
            Err(e) => {
                tracing::warn!(application_id, "Failed to load employer chat: {}", e);
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app(id: i64, status: &str, score: Option<f64>, tags: Option<&str>) -> Application {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "status": status,
            "created_at": "2024-05-01T10:00:00Z",
            "job_seeker_id": 100 + id,
            "vacancy_id": 1,
            "relevance_score": score,
            "rejection_tags": tags,
        }))
        .unwrap()
    }

    fn sample() -> Vec<Application> {
        vec![
            app(1, "pending", Some(0.82), None),
            app(2, "reviewed", Some(0.55), None),
            app(3, "rejected", Some(0.2), Some("salary,no_relocation")),
            app(4, "rejected", None, Some("salary")),
            app(5, "accepted", Some(0.7), None),
        ]
    }

    #[test]
    fn filters_compose_as_conjunction() {
        let apps = sample();
        let filter = ReviewFilter::from_query(&CandidateQuery {
            status: Some("rejected".into()),
            relevance: Some("low".into()),
            tag: Some("no_relocation".into()),
        })
        .unwrap();
        let ids: Vec<i64> = apps.iter().filter(|a| filter.matches(a)).map(|a| a.id).collect();
        assert_eq!(ids, vec![3]);

        let all = ReviewFilter::from_query(&CandidateQuery {
            status: Some("all".into()),
            relevance: Some("ALL".into()),
            tag: None,
        })
        .unwrap();
        assert_eq!(all, ReviewFilter::default());
        assert!(apps.iter().all(|a| all.matches(a)));
    }

    #[test]
    fn unknown_filter_values_are_rejected() {
        let err = ReviewFilter::from_query(&CandidateQuery {
            status: Some("archived".into()),
            ..Default::default()
        })
        .unwrap_err();
        assert!(matches!(err, Error::BadRequest(_)));
    }

    #[test]
    fn counts_cover_every_tab_and_bucket() {
        let apps = sample();
        let counts = status_counts(&apps);
        assert_eq!(
            counts,
            StatusCounts {
                all: 5,
                pending: 1,
                reviewed: 1,
                accepted: 1,
                rejected: 2
            }
        );
        let buckets = bucket_counts(&apps);
        assert_eq!(
            buckets,
            BucketCounts {
                high: 2,
                medium: 1,
                low: 2
            }
        );
    }

    #[test]
    fn decided_applications_keep_their_status() {
        use ApplicationStatus::*;
        assert_eq!(
            plan_action(Accepted, ReviewAction::Reject).unwrap(),
            ActionPlan::Keep(Accepted)
        );
        assert_eq!(
            plan_action(Rejected, ReviewAction::Accept).unwrap(),
            ActionPlan::Keep(Rejected)
        );
        assert_eq!(
            plan_action(Pending, ReviewAction::Accept).unwrap(),
            ActionPlan::Apply(Accepted)
        );
        assert_eq!(
            plan_action(Reviewed, ReviewAction::Reject).unwrap(),
            ActionPlan::Apply(Rejected)
        );
    }
}
