use crate::{
    doorbell::DoorbellClient, http_client::json_or_internal_error, types::PollResult,
    viper::Unauthorized,
};
use actix_web::{HttpResponse, Responder, web};
use log::{debug, error};

#[derive(Clone)]
pub struct Api<Doorbell>
where
    Doorbell: DoorbellClient,
{
    pub doorbell: Doorbell,
}

impl<Doorbell> Api<Doorbell>
where
    Doorbell: DoorbellClient,
{
    pub fn new(doorbell: Doorbell) -> Self {
        Api { doorbell }
    }

    pub async fn poll(api: web::Data<Self>) -> impl Responder {
        debug!("poll() called");

        let available = api.doorbell.available().await;
        HttpResponse::Ok().json(PollResult { available })
    }

    pub async fn doors(api: web::Data<Self>) -> impl Responder {
        debug!("doors() called");

        match api.doorbell.doors().await {
            Err(e) if e.downcast_ref::<Unauthorized>().is_some() => {
                error!("doors failed: {e:#}");
                HttpResponse::Unauthorized().body("unauthorized")
            }
            result => json_or_internal_error(result, "doors"),
        }
    }

    pub async fn version() -> impl Responder {
        HttpResponse::Ok().body(env!("CARGO_PKG_VERSION"))
    }
}

/// Register the status service routes
pub fn configure<Doorbell>(cfg: &mut web::ServiceConfig)
where
    Doorbell: DoorbellClient + 'static,
{
    cfg.route("/api/v1/poll", web::get().to(Api::<Doorbell>::poll))
        .route("/api/v1/doors", web::get().to(Api::<Doorbell>::doors))
        .route("/version", web::get().to(Api::<Doorbell>::version));
}
