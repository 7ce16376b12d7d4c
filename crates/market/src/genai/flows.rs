//! The marketplace's typed generation flows.
//!
//! Each flow interpolates its inputs into a prompt, declares the output
//! shape, and parses the structured result. Only the listing flow degrades on
//! failure: a draft must never be left without copy, so it substitutes
//! clearly-labeled placeholder content instead of propagating the error.
//! Every other flow propagates.

use rust_decimal_macros::dec;
use serde_json::json;
use tracing::{instrument, warn};

use artvaani_core::{GeoPoint, MarketResult, UserId};

use crate::db::ProfileRepository;
use crate::store::DocumentStore;

use super::types::{DecorSuggestions, IdentityVerdict, ListingCopy};
use super::{GenAiError, GenerateRequest, Generator};

/// The typed flows over one generator.
pub struct AiFlows<'a> {
    generator: &'a dyn Generator,
}

impl<'a> AiFlows<'a> {
    /// Create the flow set.
    #[must_use]
    pub const fn new(generator: &'a dyn Generator) -> Self {
        Self { generator }
    }

    /// Generate title, story, price, and tags for a product draft.
    ///
    /// Never fails: on any generator error this returns placeholder copy so
    /// the draft can still be saved and edited by hand.
    #[instrument(skip_all)]
    pub async fn generate_product_listing(
        &self,
        photo_data_uri: &str,
        description: &str,
    ) -> ListingCopy {
        let prompt = format!(
            "You are an expert in creating compelling product listings for an \
             e-commerce platform that sells artisan crafts from India.\n\
             Given a product photo and a basic description, generate:\n\
             1. title: a concise and catchy title, under 10 words.\n\
             2. story: a creative selling text highlighting the craft, its \
             cultural significance, and unique appeal.\n\
             3. price: a fair market price in Indian Rupees, considering the \
             likely materials, complexity, and category.\n\
             4. tags: 3 to 5 relevant tags for search and discovery.\n\n\
             Product description: {description}"
        );
        let request = GenerateRequest::structured(
            prompt,
            json!({
                "type": "object",
                "properties": {
                    "title": {"type": "string"},
                    "story": {"type": "string"},
                    "price": {"type": "number"},
                    "tags": {"type": "array", "items": {"type": "string"}},
                },
                "required": ["title", "story", "price", "tags"],
            }),
        )
        .with_media(photo_data_uri);

        match self.run::<ListingCopy>(request).await {
            Ok(copy) => copy,
            Err(error) => {
                warn!(%error, "listing generation failed, substituting placeholder copy");
                placeholder_listing()
            }
        }
    }

    /// Transcribe a voice recording into text.
    ///
    /// # Errors
    ///
    /// Returns `RemoteFailure` when the generator fails.
    #[instrument(skip_all)]
    pub async fn transcribe_audio(&self, audio_data_uri: &str) -> MarketResult<String> {
        let request = GenerateRequest::structured(
            "You are a highly accurate audio transcription service. Transcribe \
             the following recording of an Indian artisan talking about their \
             craft. Do not add any commentary, just the direct transcription.",
            json!({
                "type": "object",
                "properties": {"transcription": {"type": "string"}},
                "required": ["transcription"],
            }),
        )
        .with_media(audio_data_uri);

        #[derive(serde::Deserialize)]
        struct Output {
            transcription: String,
        }
        Ok(self.run::<Output>(request).await?.transcription)
    }

    /// Refine a raw transcript into a well-written artisan story.
    ///
    /// # Errors
    ///
    /// Returns `RemoteFailure` when the generator fails.
    #[instrument(skip_all)]
    pub async fn refine_story(&self, transcription: &str) -> MarketResult<String> {
        let prompt = format!(
            "You are an expert storyteller specializing in crafting compelling \
             narratives from transcribed voice recordings. Refine the following \
             artisan's story into a well-written, engaging narrative that \
             captures the essence of their craft and cultural background. The \
             tone should be authentic and heartfelt.\n\n\
             Transcription: {transcription}"
        );
        let request = GenerateRequest::structured(
            prompt,
            json!({
                "type": "object",
                "properties": {"refinedStory": {"type": "string"}},
                "required": ["refinedStory"],
            }),
        );

        #[derive(serde::Deserialize)]
        struct Output {
            #[serde(rename = "refinedStory")]
            refined_story: String,
        }
        Ok(self.run::<Output>(request).await?.refined_story)
    }

    /// Suggest decorations that would suit a photographed room.
    ///
    /// # Errors
    ///
    /// Returns `RemoteFailure` when the generator fails.
    #[instrument(skip_all)]
    pub async fn suggest_decorations(&self, photo_data_uri: &str) -> MarketResult<Vec<String>> {
        let request = GenerateRequest::structured(
            "You are an expert interior designer with a keen eye for artisanal \
             and handcrafted art. Analyze the provided room photo: dominant \
             colors, existing furniture, style, and overall mood. Suggest 3-4 \
             specific types of artistic decorations from Indian artisans that \
             would complement the space, briefly explaining each fit.",
            json!({
                "type": "object",
                "properties": {
                    "suggestions": {"type": "array", "items": {"type": "string"}},
                },
                "required": ["suggestions"],
            }),
        )
        .with_media(photo_data_uri);

        Ok(self.run::<DecorSuggestions>(request).await?.suggestions)
    }

    /// Check an artisan's live photo and GPS position against their profile
    /// city.
    ///
    /// A generator failure yields an unverified verdict with a reason rather
    /// than an error; a missing profile is `NotFound`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when no profile exists for `uid`, or
    /// `RemoteFailure` when the profile read fails.
    #[instrument(skip_all, fields(uid = %uid))]
    pub async fn verify_artisan_identity(
        &self,
        store: &dyn DocumentStore,
        uid: &UserId,
        photo_data_uri: &str,
        location: GeoPoint,
    ) -> MarketResult<IdentityVerdict> {
        let profile = ProfileRepository::new(store).require(uid).await?;

        let prompt = format!(
            "You are an identity verification agent for an artisan marketplace. \
             An artisan has provided a live photo and their current GPS position \
             (latitude {lat}, longitude {lon}). Their profile says they are from \
             '{city}'.\n\
             1. Determine the closest major city to the GPS position.\n\
             2. Compare it with the profile city.\n\
             3. Check whether the photo background is plausible for that \
             location (architecture, flora, general environment).\n\
             Verification succeeds ONLY IF the GPS-derived city matches the \
             profile city AND the background is plausible. On success set \
             verified true with reason \"Identity confirmed.\"; otherwise set \
             verified false and state the mismatch clearly.",
            lat = location.latitude,
            lon = location.longitude,
            city = profile.city,
        );
        let request = GenerateRequest::structured(
            prompt,
            json!({
                "type": "object",
                "properties": {
                    "verified": {"type": "boolean"},
                    "reason": {"type": "string"},
                },
                "required": ["verified", "reason"],
            }),
        )
        .with_media(photo_data_uri);

        match self.run::<IdentityVerdict>(request).await {
            Ok(verdict) => Ok(verdict),
            Err(error) => {
                warn!(%error, "identity verification generation failed");
                Ok(IdentityVerdict::rejected(
                    "The verification service could not process the request. Please try again.",
                ))
            }
        }
    }

    async fn run<T: serde::de::DeserializeOwned>(
        &self,
        request: GenerateRequest,
    ) -> Result<T, GenAiError> {
        let output = self.generator.generate(request).await?;
        serde_json::from_value(output).map_err(|e| GenAiError::Parse(e.to_string()))
    }
}

/// Copy used when generation is unavailable. Clearly labeled so nobody
/// mistakes it for real listing content.
fn placeholder_listing() -> ListingCopy {
    ListingCopy {
        title: "AI Generation Failed: Title".to_owned(),
        story: "The generation service is currently unavailable. This is \
                placeholder content; please edit the listing by hand or retry."
            .to_owned(),
        price: dec!(100),
        tags: vec!["sample".to_owned(), "placeholder".to_owned()],
    }
}
