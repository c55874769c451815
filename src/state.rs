use std::sync::Arc;

use sqlx::MySqlPool;

use crate::config::Config;
use crate::core::{Clock, SystemClock};
use crate::modules::enrollments::repositories::{CourseEnrollmentStore, MySqlCourseEnrollmentStore};
use crate::modules::fees::{
    repositories::{FeeRepository, MySqlFeeRepository},
    services::FeeService,
};
use crate::modules::franchises::{
    repositories::{FranchiseRepository, MySqlFranchiseRepository},
    services::FranchiseService,
};
use crate::modules::installments::{
    repositories::{InstallmentRepository, MySqlInstallmentRepository},
    services::InstallmentService,
};
use crate::modules::reports::{
    repositories::{MySqlReportRepository, ReportRepository},
    services::ReportService,
};

/// Persistence seams the services are built on
#[derive(Clone)]
pub struct Repositories {
    pub franchises: Arc<dyn FranchiseRepository>,
    pub fees: Arc<dyn FeeRepository>,
    pub installments: Arc<dyn InstallmentRepository>,
    pub enrollments: Arc<dyn CourseEnrollmentStore>,
    pub reports: Arc<dyn ReportRepository>,
}

impl Repositories {
    pub fn mysql(pool: &MySqlPool) -> Self {
        Self {
            franchises: Arc::new(MySqlFranchiseRepository::new(pool.clone())),
            fees: Arc::new(MySqlFeeRepository::new(pool.clone())),
            installments: Arc::new(MySqlInstallmentRepository::new(pool.clone())),
            enrollments: Arc::new(MySqlCourseEnrollmentStore::new(pool.clone())),
            reports: Arc::new(MySqlReportRepository::new(pool.clone())),
        }
    }
}

/// Services shared by every HTTP worker
#[derive(Clone)]
pub struct AppState {
    pub franchises: FranchiseService,
    pub fees: FeeService,
    pub installments: InstallmentService,
    pub reports: ReportService,
}

impl AppState {
    pub fn new(repositories: Repositories, clock: Arc<dyn Clock>, overdue_sweep_on_read: bool) -> Self {
        let fees = FeeService::new(repositories.fees, clock.clone());
        let installments =
            InstallmentService::new(fees.clone(), repositories.installments, clock.clone())
                .with_overdue_sweep_on_read(overdue_sweep_on_read);
        let franchises = FranchiseService::new(
            repositories.franchises,
            repositories.enrollments,
            fees.clone(),
            installments.clone(),
            clock.clone(),
        );
        let reports = ReportService::new(repositories.reports, franchises.clone(), clock);

        Self {
            franchises,
            fees,
            installments,
            reports,
        }
    }

    /// Production wiring over MySQL and the system clock
    pub fn mysql(pool: &MySqlPool, config: &Config) -> Self {
        Self::new(
            Repositories::mysql(pool),
            Arc::new(SystemClock),
            config.app.overdue_sweep_on_read,
        )
    }
}
