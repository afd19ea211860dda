use actix_web::{web, HttpRequest, HttpResponse};
use base64::{engine::general_purpose::STANDARD, Engine as _};

use super::owned_meeting;
use crate::error::{ApiError, ApiResult};
use crate::middleware::jwt_auth::authenticate;
use crate::models::{non_blank, CreateTranscriptRequest, NewTranscript, TranscriptQuery};
use crate::services::transcripts::record_segment;
use crate::AppState;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/api/meetings/{id}/transcripts")
            .route(web::get().to(list_transcripts))
            .route(web::post().to(add_transcript)),
    );
}

async fn list_transcripts(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<i64>,
    query: web::Query<TranscriptQuery>,
) -> ApiResult<HttpResponse> {
    let user = authenticate(&state, &req)?;
    let meeting = owned_meeting(&state, path.into_inner(), user.id)?;
    let speaker = non_blank(query.speaker.as_deref());
    Ok(HttpResponse::Ok().json(state.db.list_transcripts(meeting.id, speaker.as_deref())?))
}

/// Text segments are stored as given; audio goes through speech-to-text first
async fn add_transcript(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<i64>,
    body: web::Json<CreateTranscriptRequest>,
) -> ApiResult<HttpResponse> {
    let user = authenticate(&state, &req)?;
    let meeting = owned_meeting(&state, path.into_inner(), user.id)?;
    let request = body.into_inner();

    let mut segment = NewTranscript {
        speaker: request.speaker,
        content: String::new(),
        start_time: request.start_time,
        end_time: request.end_time,
        confidence: request.confidence,
        is_agent: false,
    };

    match (non_blank(request.content.as_deref()), request.audio_base64) {
        (Some(content), _) => segment.content = content,
        (None, Some(audio)) => {
            let bytes = STANDARD
                .decode(audio.trim())
                .map_err(|_| ApiError::bad_request("audio_base64 is not valid base64"))?;
            let result = state
                .providers
                .transcriber
                .transcribe(&bytes)
                .await
                .map_err(ApiError::BadRequest)?;
            segment.content = result.text;
            segment.confidence = segment.confidence.or(Some(result.confidence));
            if let (Some(start), None) = (segment.start_time, segment.end_time) {
                segment.end_time = Some(start + result.duration_seconds);
            }
        }
        (None, None) => return Err(ApiError::bad_request("Transcript content is required")),
    }

    let recorded = record_segment(&state, &meeting, segment).await?;
    Ok(HttpResponse::Created().json(recorded.transcript))
}
