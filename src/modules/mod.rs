pub mod enrollments;
pub mod fees;
pub mod franchises;
pub mod health;
pub mod installments;
pub mod reports;

use actix_web::web;

/// Registers every module's routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.configure(health::controllers::configure)
        .configure(franchises::controllers::configure)
        .configure(fees::controllers::configure)
        .configure(installments::controllers::configure)
        .configure(reports::controllers::configure);
}
