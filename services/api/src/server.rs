use crate::cli::ServeArgs;
use crate::infra::{
    AppState, InMemoryCandidateStore, InMemoryPaymentStore, InMemorySponsorStore,
    InMemoryStudentStore, LogOnlyRelay, ProgramState,
};
use crate::routes::with_program_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use chrono::Local;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

use padrino::config::AppConfig;
use padrino::error::AppError;
use padrino::program::ProgramContext;
use padrino::relay::ReminderDispatcher;
use padrino::telemetry;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let students = Arc::new(InMemoryStudentStore::default());
    let context = Arc::new(ProgramContext::new(
        Arc::new(InMemoryCandidateStore::default()),
        students.clone(),
        Arc::new(InMemorySponsorStore::default()),
        Arc::new(InMemoryPaymentStore::default()),
        config.program.tuition_schedule(),
        config
            .program
            .enrollment_defaults(Local::now().date_naive()),
    ));
    let reminders = Arc::new(ReminderDispatcher::new(students, Arc::new(LogOnlyRelay)));
    let program = ProgramState { context, reminders };

    let app = with_program_routes(program)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "sponsorship back office ready");

    axum::serve(listener, app).await?;
    Ok(())
}
