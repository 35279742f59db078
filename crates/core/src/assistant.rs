use crate::prompt::PromptTemplate;
use crate::retrieval::should_retrieve;
use crate::traits::{DocumentRetriever, ImageSource, TextGenerator};
use crate::transcript::Transcript;
use crate::{AssistantReply, ServiceError};
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct AssistantOptions {
    pub min_query_words: usize,
    pub images_enabled: bool,
}

impl Default for AssistantOptions {
    fn default() -> Self {
        Self {
            min_query_words: 8,
            images_enabled: true,
        }
    }
}

/// Request-handling layer. Collaborators are built once at startup and handed in.
pub struct TravelAssistant<R, G, I>
where
    R: DocumentRetriever,
    G: TextGenerator,
    I: ImageSource,
{
    retriever: R,
    generator: G,
    images: I,
    prompt: PromptTemplate,
    options: AssistantOptions,
}

impl<R, G, I> TravelAssistant<R, G, I>
where
    R: DocumentRetriever + Send + Sync,
    G: TextGenerator + Send + Sync,
    I: ImageSource + Send + Sync,
{
    pub fn new(
        retriever: R,
        generator: G,
        images: I,
        prompt: PromptTemplate,
        options: AssistantOptions,
    ) -> Self {
        Self {
            retriever,
            generator,
            images,
            prompt,
            options,
        }
    }

    pub fn retriever(&self) -> &R {
        &self.retriever
    }

    /// Runs one exchange: optional retrieval, generation, optional image. The user
    /// turn is recorded before anything can fail; the assistant turn only on success.
    pub async fn handle(
        &self,
        transcript: &mut Transcript,
        query: &str,
    ) -> Result<AssistantReply, ServiceError> {
        if query.trim().is_empty() {
            return Err(ServiceError::Request("query is empty".to_string()));
        }

        transcript.push_user(query);

        let retrieval_ran = should_retrieve(query, self.options.min_query_words);
        let records = if retrieval_ran {
            self.retriever.retrieve(query).await?
        } else {
            Vec::new()
        };
        debug!(retrieval_ran, records = records.len(), "retrieval step");

        let prompt = self.prompt.render(query, &records);
        let answer = self.generator.generate(&prompt).await?;

        let image = if self.options.images_enabled {
            self.images.fetch(query).await
        } else {
            None
        };

        info!(
            answer_chars = answer.len(),
            has_image = image.is_some(),
            "answered travel query"
        );

        transcript.push_assistant(answer.clone());

        Ok(AssistantReply {
            answer,
            image,
            records,
            retrieval_ran,
        })
    }
}
