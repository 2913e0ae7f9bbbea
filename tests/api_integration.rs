use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use gym_turnos::alerts::{AlertKind, AlertMediator};
use gym_turnos::api::TurnosClient;
use gym_turnos::calendar::CalendarSession;
use gym_turnos::config::{AlertConfig, BackendConfig, Config, Credentials};
use gym_turnos::dispatch::{
    ActionKind, BookingAction, BookingDispatcher, DispatchOutcome, SlotSelection,
};
use gym_turnos::error::TurnosError;
use gym_turnos::members::members_only;
use gym_turnos::model::{SlotBundle, Viewer};
use gym_turnos::upcoming::upcoming;
use gym_turnos::week::WeekAnchor;

/// Create a test config pointed at the mock server
fn test_config(base_url: &str) -> Config {
    Config {
        backend: BackendConfig {
            base_url: base_url.to_string(),
        },
        credentials: Credentials {
            username: "ana".to_string(),
            password: "password123".to_string(),
        },
        alerts: AlertConfig {
            notice_timeout_ms: 60_000,
        },
    }
}

/// Mount a successful login mock that hands out a token pair
async fn mount_login(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/token/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access": "test-access",
            "refresh": "test-refresh"
        })))
        .expect(1..)
        .mount(server)
        .await;
}

async fn logged_in_client(server: &MockServer) -> TurnosClient {
    mount_login(server).await;
    TurnosClient::new(&test_config(&server.uri()))
        .unwrap()
        .login()
        .await
        .unwrap()
}

fn dispatcher(client: TurnosClient) -> BookingDispatcher {
    BookingDispatcher::new(client, AlertMediator::new(Duration::from_secs(60)))
}

/// Answer every confirmation prompt the mediator shows with `accept`.
fn answer_confirmations(alerts: &AlertMediator, accept: bool) {
    let mut rx = alerts.subscribe();
    let alerts = alerts.clone();
    tokio::spawn(async move {
        while rx.changed().await.is_ok() {
            let shown = rx.borrow_and_update().clone();
            if let Some(alert) = shown.filter(|a| a.kind == AlertKind::Confirm) {
                alerts.respond(alert.id, accept);
            }
        }
    });
}

fn week() -> WeekAnchor {
    WeekAnchor::containing(slot_date())
}

fn slot_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2030, 3, 12).unwrap()
}

fn slot_hour() -> NaiveTime {
    NaiveTime::from_hms_opt(18, 0, 0).unwrap()
}

fn day_before() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2030, 3, 11)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap()
}

fn bundle(value: serde_json::Value) -> SlotBundle {
    serde_json::from_value(value).unwrap()
}

fn selection(bundle: SlotBundle) -> SlotSelection {
    SlotSelection {
        date: slot_date(),
        hour: slot_hour(),
        bundle,
    }
}

fn open_bundle() -> SlotBundle {
    bundle(json!({
        "cupos_disponibles": 3,
        "total_cupos": 10,
        "turnos": [
            { "id": 501, "estado": "DISPONIBLE", "socio": null },
            { "id": 502, "estado": "DISPONIBLE", "socio": null }
        ]
    }))
}

fn confirmed_bundle() -> SlotBundle {
    bundle(json!({
        "cupos_disponibles": 3,
        "total_cupos": 10,
        "cupos_confirmados": 1,
        "turnos": [
            { "id": 601, "estado": "CONFIRMADO", "es_mio": true, "socio": "ana" },
            { "id": 602, "estado": "DISPONIBLE", "socio": null }
        ]
    }))
}

/// Calendar payload for the test week with one 18:00 slot on the Tuesday
fn calendar_body(available: u32) -> serde_json::Value {
    json!([
        {
            "fecha": "2030-03-12",
            "horarios": [
                {
                    "hora": "18:00",
                    "cupos_disponibles": available,
                    "total_cupos": 10,
                    "turnos": [
                        { "id": 501, "estado": "RESERVADO", "es_mio": true, "socio": "ana" },
                        { "id": 502, "estado": "DISPONIBLE", "socio": null }
                    ]
                }
            ]
        }
    ])
}

async fn mount_calendar(server: &MockServer, available: u32) {
    Mock::given(method("GET"))
        .and(path("/turnos/turno/calendario/"))
        .and(query_param("fecha_inicio", "2030-03-11"))
        .and(query_param("fecha_fin", "2030-03-17"))
        .respond_with(ResponseTemplate::new(200).set_body_json(calendar_body(available)))
        .expect(1..)
        .mount(server)
        .await;
}

// ── Login tests ──────────────────────────────────────────────────

#[tokio::test]
async fn login_success() {
    let server = MockServer::start().await;
    mount_login(&server).await;

    let client = TurnosClient::new(&test_config(&server.uri())).unwrap();
    assert!(!client.is_logged_in().await);

    let client = client.login().await.unwrap();
    assert!(client.is_logged_in().await);
}

#[tokio::test]
async fn login_failure_401() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/token/"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "detail": "No active account found with the given credentials"
        })))
        .mount(&server)
        .await;

    let client = TurnosClient::new(&test_config(&server.uri())).unwrap();
    let err = match client.login().await {
        Err(e) => e,
        Ok(_) => panic!("Expected error"),
    };
    assert!(matches!(err, TurnosError::Auth(_)));
    let text = err.to_string();
    assert!(text.contains("Authentication"), "Expected auth error, got: {}", text);
    assert!(text.contains("No active account"), "Detail missing: {}", text);
}

// ── Session tests ────────────────────────────────────────────────

#[tokio::test]
async fn expired_access_token_is_refreshed_and_retried() {
    let server = MockServer::start().await;
    let client = logged_in_client(&server).await;

    Mock::given(method("GET"))
        .and(path("/general/user/"))
        .and(header("authorization", "Bearer test-access"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/token/refresh/"))
        .and(body_json(json!({ "refresh": "test-refresh" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "access": "fresh-access" })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/general/user/"))
        .and(header("authorization", "Bearer fresh-access"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 7,
            "username": "ana",
            "email": "ana@gym.test",
            "rol": "socio"
        })))
        // Retried request plus the identify call that follows
        .expect(2)
        .mount(&server)
        .await;

    let user = client.current_user().await.unwrap();
    assert_eq!(user.id, 7);
    assert_eq!(client.identify().await.unwrap(), Viewer::Member);
}

#[tokio::test]
async fn rejected_refresh_drops_session() {
    let server = MockServer::start().await;
    let client = logged_in_client(&server).await;

    Mock::given(method("GET"))
        .and(path("/general/user/"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/token/refresh/"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "detail": "Token is invalid or expired"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let result = client.current_user().await;
    assert!(matches!(result, Err(TurnosError::Auth(_))));
    assert!(!client.is_logged_in().await);
    assert_eq!(client.identify().await.unwrap(), Viewer::Guest);
}

#[tokio::test]
async fn staff_role_identifies_as_staff() {
    let server = MockServer::start().await;
    let client = logged_in_client(&server).await;

    Mock::given(method("GET"))
        .and(path("/general/user/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 1,
            "username": "admin",
            "rol": "admin"
        })))
        .mount(&server)
        .await;

    assert_eq!(client.identify().await.unwrap(), Viewer::Staff);
}

// ── Calendar tests ───────────────────────────────────────────────

#[tokio::test]
async fn calendar_is_fetched_for_the_week_range() {
    let server = MockServer::start().await;
    let client = logged_in_client(&server).await;
    mount_calendar(&server, 6).await;

    let days = client.get_calendar(week().start(), week().end()).await.unwrap();

    assert_eq!(days.len(), 1);
    assert_eq!(days[0].date, slot_date());
    let slot = &days[0].hours[0];
    assert_eq!(slot.hour, slot_hour());
    assert_eq!(slot.bundle.available, 6);
    assert_eq!(slot.bundle.reservations.len(), 2);
}

#[tokio::test]
async fn calendar_error_surfaces_backend_detail() {
    let server = MockServer::start().await;
    let client = logged_in_client(&server).await;

    Mock::given(method("GET"))
        .and(path("/turnos/turno/calendario/"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({ "detail": "boom" })))
        .mount(&server)
        .await;

    match client.get_calendar(week().start(), week().end()).await {
        Err(TurnosError::Api { status, detail }) => {
            assert_eq!(status, 500);
            assert_eq!(detail.as_deref(), Some("boom"));
        }
        other => panic!("Expected API error, got {:?}", other.map(|d| d.len())),
    }
}

// ── Booking action tests ─────────────────────────────────────────

#[tokio::test]
async fn reserve_reports_remaining_classes_and_refreshes() {
    let server = MockServer::start().await;
    let client = logged_in_client(&server).await;

    Mock::given(method("POST"))
        .and(path("/turnos/turno/501/reservar/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "detail": "Turno reservado.",
            "clases_restantes": 3
        })))
        .expect(1)
        .mount(&server)
        .await;
    // Someone else booked at the same time: the backend has 1 left, not 2
    mount_calendar(&server, 1).await;

    let dispatcher = dispatcher(client);
    let report = dispatcher
        .dispatch(
            &selection(open_bundle()),
            BookingAction::Reserve { slot_id: 501 },
            Viewer::Member,
            day_before(),
            week(),
        )
        .await;

    assert_eq!(
        report.outcome,
        DispatchOutcome::Completed {
            message: "Turno reservado. Te quedan 3 clases este mes.".to_string(),
            remaining_classes: Some(3),
        }
    );
    assert!(report.close_view);

    let shown = dispatcher.alerts().current().unwrap();
    assert_eq!(shown.kind, AlertKind::Success);
    assert!(shown.message.contains("Te quedan 3 clases"));

    // The refreshed week shows what the backend now reports
    let mut session = CalendarSession::new(week());
    let ticket = session.load();
    session.apply(ticket, Ok(Vec::new()));
    assert!(session.apply_refresh(report.refresh.unwrap()));

    let grid = session.grid(Viewer::Member, day_before()).unwrap();
    let cell = grid.cell(slot_date(), slot_hour()).unwrap();
    assert_eq!(cell.bundle.as_ref().unwrap().available, 1);
}

#[tokio::test]
async fn backend_rejection_is_shown_verbatim_and_still_refreshes() {
    let server = MockServer::start().await;
    let client = logged_in_client(&server).await;

    Mock::given(method("POST"))
        .and(path("/turnos/turno/501/reservar/"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "detail": "Ya tienes un turno reservado para este horario."
        })))
        .expect(1)
        .mount(&server)
        .await;
    mount_calendar(&server, 4).await;

    let dispatcher = dispatcher(client);
    let report = dispatcher
        .dispatch(
            &selection(open_bundle()),
            BookingAction::Reserve { slot_id: 501 },
            Viewer::Member,
            day_before(),
            week(),
        )
        .await;

    assert_eq!(
        report.outcome,
        DispatchOutcome::Failed {
            message: "Ya tienes un turno reservado para este horario.".to_string()
        }
    );
    assert!(!report.close_view);
    let refresh = report.refresh.unwrap();
    assert_eq!(refresh.anchor, week());
    assert!(refresh.result.is_ok());
    assert_eq!(dispatcher.alerts().current().unwrap().kind, AlertKind::Error);
}

#[tokio::test]
async fn cancel_inside_last_hour_is_refused_locally() {
    let server = MockServer::start().await;
    let client = logged_in_client(&server).await;

    Mock::given(method("POST"))
        .and(path("/turnos/turno/601/cancelar/"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let now = slot_date().and_hms_opt(17, 15, 0).unwrap();
    let report = dispatcher(client)
        .dispatch(
            &selection(confirmed_bundle()),
            BookingAction::Cancel { slot_id: 601 },
            Viewer::Member,
            now,
            week(),
        )
        .await;

    assert_eq!(
        report.outcome,
        DispatchOutcome::Rejected {
            message: "Ya no puedes cancelar este turno (menos de 1 hora).".to_string()
        }
    );
    assert!(report.refresh.is_none());
}

#[tokio::test]
async fn declined_cancel_sends_nothing() {
    let server = MockServer::start().await;
    let client = logged_in_client(&server).await;

    Mock::given(method("POST"))
        .and(path("/turnos/turno/601/cancelar/"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let dispatcher = dispatcher(client);
    answer_confirmations(dispatcher.alerts(), false);

    let report = dispatcher
        .dispatch(
            &selection(confirmed_bundle()),
            BookingAction::Cancel { slot_id: 601 },
            Viewer::Member,
            day_before(),
            week(),
        )
        .await;

    assert_eq!(report.outcome, DispatchOutcome::Declined);
    assert!(!report.close_view);
    assert!(report.refresh.is_none());
}

#[tokio::test]
async fn accepted_cancel_is_sent_once() {
    let server = MockServer::start().await;
    let client = logged_in_client(&server).await;

    Mock::given(method("POST"))
        .and(path("/turnos/turno/601/cancelar/"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    mount_calendar(&server, 4).await;

    let dispatcher = dispatcher(client);
    answer_confirmations(dispatcher.alerts(), true);

    let report = dispatcher
        .dispatch(
            &selection(confirmed_bundle()),
            BookingAction::Cancel { slot_id: 601 },
            Viewer::Member,
            day_before(),
            week(),
        )
        .await;

    assert_eq!(
        report.outcome,
        DispatchOutcome::Completed {
            message: "Turno cancelado con éxito.".to_string(),
            remaining_classes: None,
        }
    );
    assert!(report.refresh.is_some());
}

#[tokio::test]
async fn guest_cannot_reserve() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/turnos/turno/501/reservar/"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = TurnosClient::new(&test_config(&server.uri())).unwrap();
    let dispatcher = dispatcher(client);
    let report = dispatcher
        .dispatch(
            &selection(open_bundle()),
            BookingAction::Reserve { slot_id: 501 },
            Viewer::Guest,
            day_before(),
            week(),
        )
        .await;

    assert_eq!(
        report.outcome,
        DispatchOutcome::Rejected {
            message: "Debes iniciar sesión para realizar esta acción.".to_string()
        }
    );
    assert_eq!(dispatcher.alerts().current().unwrap().kind, AlertKind::Warning);
}

#[tokio::test]
async fn confirm_reports_remaining_classes() {
    let server = MockServer::start().await;
    let client = logged_in_client(&server).await;

    Mock::given(method("POST"))
        .and(path("/turnos/turno/701/confirmar/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "clases_restantes": 5
        })))
        .expect(1)
        .mount(&server)
        .await;
    mount_calendar(&server, 3).await;

    let pending = bundle(json!({
        "cupos_disponibles": 3,
        "cupos_reservados": 1,
        "turnos": [
            { "id": 701, "estado": "RESERVADO", "es_mio": true, "socio": "ana" },
            { "id": 702, "estado": "DISPONIBLE", "socio": null }
        ]
    }));

    let dispatcher = dispatcher(client);
    let report = dispatcher
        .dispatch(
            &selection(pending),
            BookingAction::Confirm { slot_id: 701 },
            Viewer::Member,
            day_before(),
            week(),
        )
        .await;

    assert_eq!(
        report.outcome,
        DispatchOutcome::Completed {
            message: "Turno confirmado con éxito. Te quedan 5 clases este mes.".to_string(),
            remaining_classes: Some(5),
        }
    );
    assert!(report.close_view);
    assert!(report.refresh.is_some());
}

#[tokio::test]
async fn confirm_failure_keeps_view_open() {
    let server = MockServer::start().await;
    let client = logged_in_client(&server).await;

    Mock::given(method("POST"))
        .and(path("/turnos/turno/701/confirmar/"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;
    mount_calendar(&server, 3).await;

    let pending = bundle(json!({
        "turnos": [{ "id": 701, "estado": "RESERVADO", "es_mio": true, "socio": "ana" }]
    }));
    let report = dispatcher(client)
        .dispatch(
            &selection(pending),
            BookingAction::Confirm { slot_id: 701 },
            Viewer::Member,
            day_before(),
            week(),
        )
        .await;

    assert_eq!(
        report.outcome,
        DispatchOutcome::Failed {
            message: "Error al confirmar el turno.".to_string()
        }
    );
    assert!(!report.close_view);
    assert!(report.refresh.is_some());
}

// ── Staff tests ──────────────────────────────────────────────────

fn staff_view_bundle() -> SlotBundle {
    bundle(json!({
        "cupos_disponibles": 1,
        "turnos": [
            { "id": 801, "estado": "CONFIRMADO", "socio": "luis" },
            { "id": 802, "estado": "RESERVADO", "socio": "marta" },
            { "id": 803, "estado": "DISPONIBLE", "socio": null }
        ]
    }))
}

#[tokio::test]
async fn staff_cancels_confirmed_member_reservation() {
    let server = MockServer::start().await;
    let client = logged_in_client(&server).await;

    Mock::given(method("POST"))
        .and(path("/turnos/turno/801/cancelar_staff/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "detail": "Turno de luis cancelado."
        })))
        .expect(1)
        .mount(&server)
        .await;
    mount_calendar(&server, 2).await;

    let dispatcher = dispatcher(client);
    answer_confirmations(dispatcher.alerts(), true);

    // Inside the last hour: the member rule does not bind staff
    let now = slot_date().and_hms_opt(17, 30, 0).unwrap();
    let report = dispatcher
        .dispatch(
            &selection(staff_view_bundle()),
            BookingAction::CancelForMember { slot_id: 801 },
            Viewer::Staff,
            now,
            week(),
        )
        .await;

    assert_eq!(
        report.outcome,
        DispatchOutcome::Completed {
            message: "Turno de luis cancelado.".to_string(),
            remaining_classes: None,
        }
    );
    assert!(report.refresh.is_some());
}

#[tokio::test]
async fn staff_cannot_cancel_pending_holder() {
    let server = MockServer::start().await;
    let client = logged_in_client(&server).await;

    Mock::given(method("POST"))
        .and(path("/turnos/turno/802/cancelar_staff/"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let selection = selection(staff_view_bundle());
    let offered: Vec<_> = selection
        .available_actions(Viewer::Staff, day_before())
        .into_iter()
        .filter(|a| a.kind == ActionKind::CancelForMember)
        .map(|a| a.slot_id)
        .collect();
    assert_eq!(offered, vec![801]);

    let report = dispatcher(client)
        .dispatch(
            &selection,
            BookingAction::CancelForMember { slot_id: 802 },
            Viewer::Staff,
            day_before(),
            week(),
        )
        .await;

    assert!(matches!(report.outcome, DispatchOutcome::Rejected { .. }));
    assert!(report.refresh.is_none());
}

#[tokio::test]
async fn staff_generates_week_after_confirming() {
    let server = MockServer::start().await;
    let client = logged_in_client(&server).await;

    Mock::given(method("POST"))
        .and(path("/turnos/turno/generar_turnos_semana/"))
        .and(body_json(json!({ "fecha_inicio": "2030-03-11" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "turnos_creados": 840,
            "turnos_existentes": 20,
            "errores": []
        })))
        .expect(1)
        .mount(&server)
        .await;
    mount_calendar(&server, 10).await;

    let dispatcher = dispatcher(client);
    answer_confirmations(dispatcher.alerts(), true);

    let report = dispatcher.generate_week(Viewer::Staff, week()).await;

    assert_eq!(
        report.outcome,
        DispatchOutcome::Completed {
            message: "Se crearon 840 turnos. 20 ya existían.".to_string(),
            remaining_classes: None,
        }
    );
    assert_eq!(report.generation.unwrap().created, 840);
    assert_eq!(report.refresh.unwrap().anchor, week());
}

#[tokio::test]
async fn member_cannot_generate_week() {
    let server = MockServer::start().await;
    let client = logged_in_client(&server).await;

    Mock::given(method("POST"))
        .and(path("/turnos/turno/generar_turnos_semana/"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let report = dispatcher(client).generate_week(Viewer::Member, week()).await;

    assert!(matches!(report.outcome, DispatchOutcome::Rejected { .. }));
    assert!(report.refresh.is_none());
}

#[tokio::test]
async fn declined_generation_sends_nothing() {
    let server = MockServer::start().await;
    let client = logged_in_client(&server).await;

    Mock::given(method("POST"))
        .and(path("/turnos/turno/generar_turnos_semana/"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let dispatcher = dispatcher(client);
    answer_confirmations(dispatcher.alerts(), false);

    let report = dispatcher.generate_week(Viewer::Staff, week()).await;
    assert_eq!(report.outcome, DispatchOutcome::Declined);
    assert!(report.refresh.is_none());
}

#[tokio::test]
async fn staff_reserves_for_member_with_member_id() {
    let server = MockServer::start().await;
    let client = logged_in_client(&server).await;

    Mock::given(method("POST"))
        .and(path("/turnos/turno/501/reservar_para_socio/"))
        .and(body_json(json!({ "socio_id": 31 })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "detail": "Turno reservado para el socio."
        })))
        .expect(1)
        .mount(&server)
        .await;
    mount_calendar(&server, 3).await;

    let report = dispatcher(client)
        .dispatch(
            &selection(open_bundle()),
            BookingAction::ReserveForMember {
                slot_id: 501,
                member_id: 31,
            },
            Viewer::Staff,
            day_before(),
            week(),
        )
        .await;

    assert!(matches!(report.outcome, DispatchOutcome::Completed { .. }));
}

#[tokio::test]
async fn member_list_keeps_only_members() {
    let server = MockServer::start().await;
    let client = logged_in_client(&server).await;

    Mock::given(method("GET"))
        .and(path("/general/usuarios/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 1, "username": "admin", "perfil__rol": "admin" },
            { "id": 2, "username": "profe", "perfil__rol": "entrenador" },
            { "id": 31, "username": "luis", "email": "luis@mail.test", "perfil__rol": "socio" }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let members = members_only(client.list_users().await.unwrap());
    assert_eq!(members.len(), 1);
    assert_eq!(members[0].id, 31);
}

// ── Upcoming reservation tests ───────────────────────────────────

#[tokio::test]
async fn upcoming_lists_next_own_reservations() {
    let server = MockServer::start().await;
    let client = logged_in_client(&server).await;

    Mock::given(method("GET"))
        .and(path("/turnos/turno/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 1, "hora_inicio": "2030-03-11T09:00:00", "estado": "CONFIRMADO", "socio": 7 },
            { "id": 2, "hora_inicio": "2030-03-12T18:00:00", "estado": "RESERVADO", "socio": 7 },
            { "id": 3, "hora_inicio": "2030-03-12T19:00:00", "estado": "SOLICITUD", "socio": null },
            { "id": 4, "hora_inicio": "2030-03-13T08:00:00", "estado": "CONFIRMADO", "socio": 7 },
            { "id": 5, "hora_inicio": "2030-03-14T08:00:00", "estado": "CONFIRMADO", "socio": 7 },
            { "id": 6, "hora_inicio": "2030-03-15T08:00:00", "estado": "CONFIRMADO", "socio": 7 }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let records = client.list_slots().await.unwrap();
    let ids: Vec<_> = upcoming(&records, 7, day_before()).iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![2, 4, 5]);
}
