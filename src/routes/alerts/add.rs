use crate::alerts::{AlertDispatcher, AlertRequest, DispatchResult};
use crate::helpers::JsonResponse;
use actix_web::{post, web, Responder, Result};
use serde_valid::Validate;
use std::sync::Arc;

/// Manual alert. Suppressed alerts still answer 200 with `success: false`;
/// a body outside the field limits is a 400 and is never dispatched.
#[tracing::instrument(name = "Send alert.", skip(dispatcher))]
#[post("")]
pub async fn add_handler(
    form: web::Json<AlertRequest>,
    dispatcher: web::Data<Arc<AlertDispatcher>>,
) -> Result<impl Responder> {
    if let Err(errors) = form.validate() {
        return Err(JsonResponse::<DispatchResult>::build().form_error(errors.to_string()));
    }

    let result = dispatcher.send_alert(form.into_inner()).await;
    let message = match result.reason {
        Some(reason) => format!("Alert suppressed: {:?}", reason),
        None => "Alert dispatched".to_string(),
    };
    Ok(JsonResponse::build().set_item(result).ok(&message))
}
