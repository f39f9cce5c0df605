use stream_chat_test_endpoint::{
    PresetChunk, PresetRejection, PresetResponse, TestEndpoint,
};

use super::*;
use crate::error::ExchangeErrorKind;
use crate::transcript::Speaker;

fn client_with(responses: Vec<PresetResponse>) -> (TestEndpoint, EndpointClient) {
    let endpoint = TestEndpoint::default();
    for response in responses {
        endpoint.add_response(response);
    }
    let client = EndpointClient::new(endpoint.clone());
    (endpoint, client)
}

fn bytes_chunks(chunks: &[&[u8]]) -> PresetResponse {
    PresetResponse::with_chunks(
        chunks
            .iter()
            .map(|bytes| PresetChunk::Bytes(bytes.to_vec()))
            .collect::<Vec<_>>(),
    )
}

#[tokio::test]
async fn test_simple_exchange() {
    let (endpoint, client) =
        client_with(vec![PresetResponse::with_text_chunks(["4"])]);

    let mut session = ChatSession::new();
    session.set_pending_input("What is 2+2?");
    let outcome = session.submit(&client, |_| {}).await.unwrap();

    assert_eq!(outcome, SubmitOutcome::Completed);
    assert_eq!(session.transcript().as_slice(), [
        Turn::user("What is 2+2?"),
        Turn::bot("4"),
    ]);
    assert_eq!(session.pending_input(), "");
    assert_eq!(session.phase(), ExchangePhase::Idle);
    assert_eq!(endpoint.requests(), vec![ChatRequest::new("What is 2+2?")]);
}

#[tokio::test]
async fn test_user_turn_comes_before_request() {
    let (endpoint, client) =
        client_with(vec![PresetResponse::with_text_chunks(["ok"])]);

    let mut session = ChatSession::new();
    session.set_pending_input("  Hello there \n");
    let mut updates = 0;
    session
        .submit(&client, |session| {
            if updates == 0 {
                assert_eq!(endpoint.request_count(), 0);
                assert_eq!(session.transcript().as_slice(), [Turn::user(
                    "Hello there"
                )]);
                assert_eq!(session.pending_input(), "");
                assert_eq!(
                    session.phase(),
                    ExchangePhase::AwaitingFirstChunk
                );
            }
            updates += 1;
        })
        .await
        .unwrap();

    assert!(updates >= 2);
    assert_eq!(endpoint.requests(), vec![ChatRequest::new("Hello there")]);
}

#[tokio::test]
async fn test_whitespace_input_is_ignored() {
    let (endpoint, client) = client_with(vec![]);

    for input in ["", "  ", "\t\n"] {
        let mut session = ChatSession::new();
        session.set_pending_input(input);
        let mut updated = false;
        let outcome = session
            .submit(&client, |_| updated = true)
            .await
            .unwrap();

        assert_eq!(outcome, SubmitOutcome::Ignored);
        assert!(!updated);
        assert!(session.transcript().is_empty());
        assert_eq!(session.pending_input(), input);
    }
    assert_eq!(endpoint.request_count(), 0);
}

#[tokio::test]
async fn test_fragments_are_concatenated() {
    let (_, client) = client_with(vec![PresetResponse::with_text_chunks([
        "He", "llo", " world",
    ])]);

    let mut session = ChatSession::new();
    session.set_pending_input("Greet me");
    let mut bot_texts = Vec::new();
    session
        .submit(&client, |session| {
            if let Some(idx) = session.open_bot_turn() {
                let turn = session.transcript().get(idx).unwrap();
                bot_texts.push(turn.text().to_owned());
            }
        })
        .await
        .unwrap();

    assert_eq!(bot_texts, ["He", "Hello", "Hello world"]);
    assert_eq!(session.transcript().as_slice(), [
        Turn::user("Greet me"),
        Turn::bot("Hello world"),
    ]);
    assert_eq!(session.open_bot_turn(), None);
}

#[tokio::test]
async fn test_split_multibyte_character() {
    let (_, client) = client_with(vec![bytes_chunks(&[
        b"caf\xC3",
        b"\xA9 \xF0\x9F",
        b"\x91",
        b"\x8B",
    ])]);

    let mut session = ChatSession::new();
    session.set_pending_input("Coffee?");
    let outcome = session.submit(&client, |_| {}).await.unwrap();

    assert_eq!(outcome, SubmitOutcome::Completed);
    assert_eq!(session.transcript().get(1), Some(&Turn::bot("café 👋")));
}

#[tokio::test]
async fn test_consecutive_exchanges() {
    let (_, client) = client_with(vec![
        PresetResponse::with_text_chunks(["Hi!"]),
        PresetResponse::with_text_chunks(["Bye", "!"]),
    ]);

    let mut session = ChatSession::new();
    session.set_pending_input("Hello");
    session.submit(&client, |_| {}).await.unwrap();
    session.set_pending_input("Goodbye");
    session.submit(&client, |_| {}).await.unwrap();

    assert_eq!(session.transcript().as_slice(), [
        Turn::user("Hello"),
        Turn::bot("Hi!"),
        Turn::user("Goodbye"),
        Turn::bot("Bye!"),
    ]);
}

#[tokio::test]
async fn test_empty_reply() {
    let (_, client) =
        client_with(vec![PresetResponse::with_text_chunks(Vec::<String>::new())]);

    let mut session = ChatSession::new();
    session.set_pending_input("Anyone?");
    let outcome = session.submit(&client, |_| {}).await.unwrap();

    assert_eq!(outcome, SubmitOutcome::Completed);
    assert_eq!(session.transcript().as_slice(), [Turn::user("Anyone?")]);
    assert_eq!(session.phase(), ExchangePhase::Idle);
}

#[tokio::test]
async fn test_rejected_requests() {
    let (_, client) = client_with(vec![
        PresetResponse::rejected(PresetRejection::NetworkUnavailable),
        PresetResponse::rejected(PresetRejection::Status(500)),
    ]);

    let mut session = ChatSession::new();
    for expected in [
        ExchangeErrorKind::NetworkUnavailable,
        ExchangeErrorKind::NonSuccessStatus,
    ] {
        session.set_pending_input("Hi");
        let outcome = session.submit(&client, |_| {}).await.unwrap();
        let SubmitOutcome::Failed(err) = outcome else {
            panic!("the exchange should have failed");
        };
        assert_eq!(err.kind(), expected);

        let last = session.transcript().iter().last().unwrap();
        assert_eq!(last.speaker(), Speaker::Failure(expected));
        assert_eq!(session.phase(), ExchangePhase::Idle);
    }
    assert_eq!(session.transcript().len(), 4);
}

#[tokio::test]
async fn test_interrupted_stream_keeps_partial_text() {
    let (_, client) = client_with(vec![
        PresetResponse::with_chunks([
            PresetChunk::Text("Once upon".to_owned()),
            PresetChunk::Interrupt,
        ]),
        PresetResponse::with_text_chunks(["Recovered"]),
    ]);

    let mut session = ChatSession::new();
    session.set_pending_input("Tell a story");
    let outcome = session.submit(&client, |_| {}).await.unwrap();
    assert!(matches!(
        outcome,
        SubmitOutcome::Failed(ref err)
            if err.kind() == ExchangeErrorKind::StreamInterrupted
    ));

    let turns = session.transcript().as_slice();
    assert_eq!(turns.len(), 3);
    assert_eq!(turns[1], Turn::bot("Once upon"));
    assert_eq!(
        turns[2].speaker(),
        Speaker::Failure(ExchangeErrorKind::StreamInterrupted)
    );

    // The session is usable again, and the new reply gets its own turn.
    session.set_pending_input("Again");
    session.submit(&client, |_| {}).await.unwrap();
    assert_eq!(session.transcript().get(4), Some(&Turn::bot("Recovered")));
}

#[tokio::test]
async fn test_decode_errors() {
    let (_, client) = client_with(vec![
        bytes_chunks(&[b"ok", b"\xFF"]),
        bytes_chunks(&[b"caf\xC3"]),
    ]);

    let mut session = ChatSession::with_decode_mode(DecodeMode::Strict);
    session.set_pending_input("Invalid");
    let outcome = session.submit(&client, |_| {}).await.unwrap();
    assert!(matches!(
        outcome,
        SubmitOutcome::Failed(ref err)
            if err.kind() == ExchangeErrorKind::DecodeError
    ));

    session.set_pending_input("Truncated");
    let outcome = session.submit(&client, |_| {}).await.unwrap();
    assert!(matches!(
        outcome,
        SubmitOutcome::Failed(ref err)
            if err.kind() == ExchangeErrorKind::DecodeError
    ));

    let speakers = session
        .transcript()
        .iter()
        .map(Turn::speaker)
        .collect::<Vec<_>>();
    assert_eq!(speakers, [
        Speaker::User,
        Speaker::Bot,
        Speaker::Failure(ExchangeErrorKind::DecodeError),
        Speaker::User,
        Speaker::Bot,
        Speaker::Failure(ExchangeErrorKind::DecodeError),
    ]);
    assert_eq!(session.transcript().get(4), Some(&Turn::bot("caf")));
}

fn strict_transcript_after(chunks: &[&[u8]]) -> Transcript {
    let mut session = ChatSession::with_decode_mode(DecodeMode::Strict);
    session.begin_exchange_with("x".to_owned()).unwrap();
    for chunk in chunks {
        if session.push_chunk(chunk).is_err() {
            break;
        }
    }
    session.transcript().clone()
}

#[test]
fn test_invalid_bytes_do_not_depend_on_chunk_boundaries() {
    let whole = strict_transcript_after(&[b"ok\xFF"]);
    let split = strict_transcript_after(&[b"ok", b"\xFF"]);
    assert_eq!(whole, split);
    assert_eq!(whole.get(1), Some(&Turn::bot("ok")));
    assert_eq!(
        whole.get(2).map(Turn::speaker),
        Some(Speaker::Failure(ExchangeErrorKind::DecodeError))
    );
}

#[tokio::test]
async fn test_invalid_bytes_are_replaced_by_default() {
    let (_, client) = client_with(vec![bytes_chunks(&[b"a\xFFb"])]);

    let mut session = ChatSession::new();
    assert_eq!(session.decode_mode(), DecodeMode::Lossy);
    session.set_pending_input("Replace");
    let outcome = session.submit(&client, |_| {}).await.unwrap();

    assert_eq!(outcome, SubmitOutcome::Completed);
    assert_eq!(
        session.transcript().get(1),
        Some(&Turn::bot("a\u{FFFD}b"))
    );
}

#[tokio::test]
async fn test_lossy_decoding() {
    let (_, client) = client_with(vec![bytes_chunks(&[b"a\xFFb", b"\xC3"])]);

    let mut session = ChatSession::with_decode_mode(DecodeMode::Lossy);
    session.set_pending_input("Lossy");
    let outcome = session.submit(&client, |_| {}).await.unwrap();

    assert_eq!(outcome, SubmitOutcome::Completed);
    assert_eq!(
        session.transcript().get(1),
        Some(&Turn::bot("a\u{FFFD}b\u{FFFD}"))
    );
}

#[test]
fn test_single_open_exchange() {
    let mut session = ChatSession::new();
    session.set_pending_input("first");
    let request = session.begin_exchange().unwrap().unwrap();
    assert_eq!(request, ChatRequest::new("first"));

    session.set_pending_input("second");
    assert_eq!(
        session.begin_exchange(),
        Err(SubmitError::ExchangeInProgress)
    );
    assert_eq!(
        session.begin_exchange_with("third".to_owned()),
        Err(SubmitError::ExchangeInProgress)
    );
    // The refused draft is still there.
    assert_eq!(session.pending_input(), "second");
    assert_eq!(session.transcript().len(), 1);

    session.finish_exchange().unwrap();
    assert_eq!(
        session.begin_exchange_with("  ".to_owned()),
        Err(SubmitError::EmptyInput)
    );
    assert!(session.begin_exchange().unwrap().is_some());
}

#[test]
fn test_phases() {
    let mut session = ChatSession::new();
    assert_eq!(session.phase(), ExchangePhase::Idle);
    // Chunks outside of an exchange are dropped.
    assert!(!session.push_chunk(b"stray").unwrap());
    assert!(session.transcript().is_empty());

    session.begin_exchange_with("Hi".to_owned()).unwrap();
    assert_eq!(session.phase(), ExchangePhase::AwaitingFirstChunk);

    // Half a character doesn't create the bot turn yet.
    assert!(!session.push_chunk(b"\xE4\xB8").unwrap());
    assert_eq!(session.phase(), ExchangePhase::AwaitingFirstChunk);
    assert_eq!(session.open_bot_turn(), None);

    assert!(session.push_chunk(b"\x96").unwrap());
    assert_eq!(session.phase(), ExchangePhase::StreamingAppend);
    assert_eq!(session.open_bot_turn(), Some(1));

    assert!(session.push_chunk("界".as_bytes()).unwrap());
    session.finish_exchange().unwrap();
    assert_eq!(session.phase(), ExchangePhase::Idle);
    assert_eq!(session.transcript().get(1), Some(&Turn::bot("世界")));
}

#[test]
fn test_open_turn_is_tracked_explicitly() {
    let mut session = ChatSession::new();
    session.begin_exchange_with("Hi".to_owned()).unwrap();
    session.push_chunk(b"Hel").unwrap();
    let err = ExchangeError::new("boom", ExchangeErrorKind::Other);
    session.fail_exchange(&err);

    // The previous bot turn is closed, so a new exchange starts its own
    // bot turn instead of extending the old one.
    session.begin_exchange_with("Again".to_owned()).unwrap();
    session.push_chunk(b"lo").unwrap();
    session.finish_exchange().unwrap();

    assert_eq!(session.transcript().as_slice(), [
        Turn::user("Hi"),
        Turn::bot("Hel"),
        Turn::failure(ExchangeErrorKind::Other, "boom"),
        Turn::user("Again"),
        Turn::bot("lo"),
    ]);
}
