//! Vision-model arbitration over the top-ranked photos.
//!
//! Best-effort by design: arbitration can improve the hero choice but must
//! never block it. Every failure here (thumbnail fetches, the model call,
//! verdict parsing) collapses to "no opinion" and the heuristic order stands.

use serde::Deserialize;

use crate::ai::{ImagePart, VisionModel};
use crate::config::PipelineConfig;
use crate::photo;
use crate::places::{PhotoCandidate, PlacesProvider};

const SLOT_LABELS: [char; 8] = ['A', 'B', 'C', 'D', 'E', 'F', 'G', 'H'];

/// Fewer than this many viable thumbnails and there is nothing to arbitrate.
const MIN_SLOTS: usize = 2;

/// A labeled thumbnail presented to the model.
struct CandidateSlot {
    label: char,
    reference: String,
    mime_type: String,
    bytes: Vec<u8>,
}

/// Ask the vision model which of the top-ranked candidates makes the best
/// hero photo. Returns the chosen photo reference, or `None` when the model
/// had no usable opinion for any reason.
pub async fn pick_hero_reference(
    places: &dyn PlacesProvider,
    model: &dyn VisionModel,
    ranked: &[PhotoCandidate],
    config: &PipelineConfig,
) -> Option<String> {
    let slots = assemble_slots(places, ranked, config).await;
    if slots.len() < MIN_SLOTS {
        tracing::debug!(
            "only {} viable thumbnails, skipping arbitration",
            slots.len()
        );
        return None;
    }

    let labels: Vec<char> = slots.iter().map(|s| s.label).collect();
    let prompt = render_hero_prompt(&labels);
    let images: Vec<ImagePart> = slots
        .iter()
        .map(|s| ImagePart {
            mime_type: s.mime_type.clone(),
            data: s.bytes.clone(),
        })
        .collect();

    let response = match model.generate(&prompt, &images).await {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!("vision model call failed, falling back to ranking: {}", e);
            return None;
        }
    };

    let choice = parse_verdict(&response, &labels)?;
    let slot = slots.into_iter().find(|s| s.label == choice)?;
    tracing::info!("vision model picked candidate {}", slot.label);
    Some(slot.reference)
}

/// Fetch thumbnails for the top candidates and label the ones that arrive
/// intact. Candidates whose thumbnail fails to download or is implausibly
/// small are left out of the slate.
async fn assemble_slots(
    places: &dyn PlacesProvider,
    ranked: &[PhotoCandidate],
    config: &PipelineConfig,
) -> Vec<CandidateSlot> {
    let mut slots: Vec<CandidateSlot> = Vec::new();

    for candidate in ranked.iter().take(config.ai_candidates.min(SLOT_LABELS.len())) {
        let payload = match places
            .photo_bytes(&candidate.reference, config.thumbnail_width)
            .await
        {
            Ok(payload) => payload,
            Err(e) => {
                tracing::debug!("thumbnail fetch failed, dropping from slate: {}", e);
                continue;
            }
        };

        if payload.bytes.len() < config.min_thumbnail_bytes {
            tracing::debug!(
                "thumbnail too small ({} bytes), dropping from slate",
                payload.bytes.len()
            );
            continue;
        }

        let mime_type = photo::resolve_content_type(payload.content_type.as_deref(), &payload.bytes);
        slots.push(CandidateSlot {
            label: SLOT_LABELS[slots.len()],
            reference: candidate.reference.clone(),
            mime_type,
            bytes: payload.bytes,
        });
    }

    slots
}

fn render_hero_prompt(labels: &[char]) -> String {
    let label_list = labels
        .iter()
        .map(|l| l.to_string())
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        r#"You are choosing the best hero photo for a live music venue's listing page.

You are given {count} candidate photos, labeled in order: {label_list}.

Pick the photo that best shows what the venue is like to visit: the stage, the room, the bar, the building front, or clear signage.

Avoid photos that are blurry, dark, or watermarked, and avoid logos, maps, menus, close-ups of food or drinks, selfies, and promotional graphics.

Respond with ONLY a JSON object in this exact form: {{"choice": "<label>", "reason": "<one short sentence>"}}"#,
        count = labels.len(),
    )
}

#[derive(Debug, Deserialize)]
struct Verdict {
    choice: String,
    #[serde(default)]
    reason: Option<String>,
}

/// Parse the model's verdict into a slot label.
///
/// Tolerates code fences and prose around the JSON object but insists the
/// choice itself is a single character from the offered labels. Anything
/// else is treated as no opinion.
fn parse_verdict(response: &str, labels: &[char]) -> Option<char> {
    let body = extract_json_object(response)?;

    let verdict: Verdict = match serde_json::from_str(body) {
        Ok(verdict) => verdict,
        Err(e) => {
            tracing::debug!("unparseable verdict from vision model: {}", e);
            return None;
        }
    };

    let trimmed = verdict.choice.trim();
    let mut chars = trimmed.chars();
    let (Some(first), None) = (chars.next(), chars.next()) else {
        tracing::debug!("verdict choice is not a single label: {:?}", verdict.choice);
        return None;
    };

    let label = first.to_ascii_uppercase();
    if !labels.contains(&label) {
        tracing::debug!("verdict choice {:?} is not an offered label", label);
        return None;
    }

    if let Some(reason) = verdict.reason {
        tracing::debug!("vision model reason: {}", reason);
    }

    Some(label)
}

/// Pull the first JSON object out of a response that may be wrapped in a
/// Markdown code fence or surrounding prose.
fn extract_json_object(response: &str) -> Option<&str> {
    let trimmed = response.trim();

    let body = if let Some(rest) = trimmed.strip_prefix("```") {
        let rest = rest.strip_prefix("json").unwrap_or(rest);
        rest.split("```").next().unwrap_or(rest)
    } else {
        trimmed
    };

    let start = body.find('{')?;
    let end = body.rfind('}')?;
    (end > start).then(|| &body[start..=end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::FakeVisionModel;
    use crate::places::MockPlaces;

    const LABELS: [char; 3] = ['A', 'B', 'C'];

    #[test]
    fn parses_fenced_verdict() {
        let response = "```json\n{\"choice\": \"B\", \"reason\": \"clear shot of the stage\"}\n```";
        assert_eq!(parse_verdict(response, &LABELS), Some('B'));
    }

    #[test]
    fn parses_bare_lowercase_verdict() {
        let response = r#"{"choice": "b"}"#;
        assert_eq!(parse_verdict(response, &LABELS), Some('B'));
    }

    #[test]
    fn parses_verdict_wrapped_in_prose() {
        let response = "Sure! Here is my pick: {\"choice\": \"A\", \"reason\": \"bright\"} Hope that helps.";
        assert_eq!(parse_verdict(response, &LABELS), Some('A'));
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(parse_verdict("I like the second one best", &LABELS), None);
    }

    #[test]
    fn rejects_label_outside_slate() {
        let response = r#"{"choice": "F"}"#;
        assert_eq!(parse_verdict(response, &LABELS), None);
    }

    #[test]
    fn rejects_multi_character_choice() {
        let response = r#"{"choice": "A and B"}"#;
        assert_eq!(parse_verdict(response, &LABELS), None);
    }

    fn thumb_config() -> PipelineConfig {
        PipelineConfig {
            min_thumbnail_bytes: 4,
            ..PipelineConfig::default()
        }
    }

    fn thumb(byte: u8) -> Vec<u8> {
        vec![byte; 8]
    }

    #[tokio::test]
    async fn happy_path_returns_chosen_reference() {
        let config = thumb_config();
        let places = MockPlaces::new()
            .with_photo("ref-a", thumb(1))
            .with_photo("ref-b", thumb(2));
        let model = FakeVisionModel::with_response(
            "hero photo",
            "```json\n{\"choice\": \"B\", \"reason\": \"shows the room\"}\n```",
        );
        let ranked = vec![
            PhotoCandidate::new("ref-a", Some(800), Some(600)),
            PhotoCandidate::new("ref-b", Some(640), Some(480)),
        ];

        let pick = pick_hero_reference(&places, &model, &ranked, &config).await;
        assert_eq!(pick, Some("ref-b".to_string()));
        assert_eq!(model.call_count(), 1);
    }

    #[tokio::test]
    async fn too_few_viable_thumbnails_skips_the_model() {
        let config = thumb_config();
        let places = MockPlaces::new()
            .with_photo("ref-a", thumb(1))
            .with_photo_error("ref-b", "connection reset");
        let model = FakeVisionModel::default();
        let ranked = vec![
            PhotoCandidate::new("ref-a", Some(800), Some(600)),
            PhotoCandidate::new("ref-b", Some(640), Some(480)),
        ];

        let pick = pick_hero_reference(&places, &model, &ranked, &config).await;
        assert_eq!(pick, None);
        assert_eq!(model.call_count(), 0);
    }

    #[tokio::test]
    async fn undersized_thumbnail_is_dropped_from_slate() {
        let config = thumb_config();
        let places = MockPlaces::new()
            .with_photo("ref-a", thumb(1))
            .with_photo("ref-b", vec![0; 2]);
        let model = FakeVisionModel::default();
        let ranked = vec![
            PhotoCandidate::new("ref-a", Some(800), Some(600)),
            PhotoCandidate::new("ref-b", Some(640), Some(480)),
        ];

        let pick = pick_hero_reference(&places, &model, &ranked, &config).await;
        assert_eq!(pick, None);
        assert_eq!(model.call_count(), 0);
    }

    #[tokio::test]
    async fn model_failure_means_no_opinion() {
        let config = thumb_config();
        let places = MockPlaces::new()
            .with_photo("ref-a", thumb(1))
            .with_photo("ref-b", thumb(2));
        let model = FakeVisionModel::failing("rate limited");
        let ranked = vec![
            PhotoCandidate::new("ref-a", Some(800), Some(600)),
            PhotoCandidate::new("ref-b", Some(640), Some(480)),
        ];

        let pick = pick_hero_reference(&places, &model, &ranked, &config).await;
        assert_eq!(pick, None);
        assert_eq!(model.call_count(), 1);
    }

    #[tokio::test]
    async fn slate_is_capped_at_configured_size() {
        let config = thumb_config();
        let places = MockPlaces::new()
            .with_photo("ref-a", thumb(1))
            .with_photo("ref-b", thumb(2))
            .with_photo("ref-c", thumb(3))
            .with_photo("ref-d", thumb(4))
            .with_photo("ref-e", thumb(5));
        let model = FakeVisionModel::with_response("hero photo", r#"{"choice": "A"}"#);
        let ranked: Vec<PhotoCandidate> = ["ref-a", "ref-b", "ref-c", "ref-d", "ref-e"]
            .iter()
            .map(|r| PhotoCandidate::new(*r, Some(800), Some(600)))
            .collect();

        let pick = pick_hero_reference(&places, &model, &ranked, &config).await;
        assert_eq!(pick, Some("ref-a".to_string()));
        // Four thumbnail fetches, not five: the slate stops at ai_candidates.
        assert_eq!(places.photo_requests().len(), 4);
    }
}
