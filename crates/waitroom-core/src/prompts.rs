//! Fixed instructions and patient-facing messages.

/// System instruction prepended to every completion request.
pub const SYSTEM_PROMPT: &str = "You are a friendly intake assistant talking \
with a patient who is waiting for a clinical visit. Help the patient describe \
their main problem and collect the important details, without giving a \
diagnosis or treatment advice. Ask one short question at a time and keep an \
empathetic tone. Over the conversation, cover: the chief complaint and its \
duration, the history of the present illness, current medications and doses, \
allergies, past medical and surgical history, family history, lifestyle \
(smoking, alcohol, occupation), a pain score from 0 to 10, and a few short \
mood and anxiety questions. Use the simplest words possible.";

/// Greeting shown when a patient opens a new session.
pub const GREETING: &str = "Hello and welcome! In one sentence, what is the \
main problem that brings you in today, and when did it start?";

/// Instruction for the extraction capability. The capability must answer with
/// a single JSON object holding `key_points`, `structured` and `free_text`.
pub const SUMMARY_INSTRUCTION: &str = "From the whole conversation below, \
produce a single JSON object with exactly three members: \
(1) \"key_points\": an array of 3 to 7 very short sentences with the most \
important findings; \
(2) \"structured\": an object using only these fields where known: \
chief_complaint, onset, duration, history_of_present_illness, medications, \
allergies, past_medical_history, surgical_history, family_history, \
social_history, pain_score, mood_screen; \
(3) \"free_text\": a readable summary of at most 120 words. \
Leave a field empty when the information is unknown. Normalise durations \
(for example \"3 days\"). List medications with name, dose and frequency. \
Highlight drug allergies. Answer with the JSON object only.";

/// Appended as the assistant turn once a session reaches its message cap.
pub const CAP_MESSAGE: &str = "We have reached the message limit for this \
visit. Thank you for the details you shared; the clinician will review a \
summary of our conversation.";

/// Appended as the assistant turn when the reasoning capability fails.
pub const FALLBACK_MESSAGE: &str = "Sorry, I can't answer right now. Please \
continue describing your symptoms, or let the front desk know if you need \
help.";

/// Key point of the degraded summary recorded when extraction fails.
pub const DEGRADED_KEY_POINT: &str = "Conversation took place";

/// Free text of the degraded summary recorded when extraction fails.
pub const DEGRADED_FREE_TEXT: &str = "Summary unavailable.";
