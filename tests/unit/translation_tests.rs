/*!
 * Tests for the batch translation pipeline through its public API
 */

use std::time::Duration;
use xltrans::providers::mock::{MockProvider, MockRequest};
use xltrans::translation::batch::{self, Reference, TextUnit};
use xltrans::translation::codec::{self, SEPARATOR};
use xltrans::translation::{TranslationOptions, TranslationService};

fn fast_options() -> TranslationOptions {
    TranslationOptions {
        rate_limit_delay: Duration::ZERO,
        timeout: Duration::from_secs(5),
        no_think: false,
        prompt_suffix: None,
    }
}

fn texts(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Test that an intermittent provider only loses the failing batches
#[tokio::test]
async fn test_translate_batch_report_withIntermittentProvider_shouldPassThroughFailedBatches() {
    let provider = MockProvider::intermittent(2);
    let service = TranslationService::new(&provider, fast_options());

    let mut passthrough = Vec::new();
    for round in 0..4 {
        let input = texts(&[&format!("行{}", round), "列"]);
        let report = service.translate_batch_report(&input, "ja", "en").await;
        assert_eq!(report.segments.len(), 2);
        if report.passthrough {
            assert_eq!(report.segments, input);
        }
        passthrough.push(report.passthrough);
    }

    assert_eq!(passthrough, vec![false, true, false, true]);
    assert_eq!(provider.request_count(), 4);
}

fn reversed_order(request: &MockRequest) -> String {
    let mut segments = request.segments();
    segments.reverse();
    segments.join(SEPARATOR)
}

/// Test that custom responses are taken positionally
#[tokio::test]
async fn test_translate_batch_withCustomResponse_shouldAlignByPosition() {
    let provider = MockProvider::working().with_custom_response(reversed_order);
    let service = TranslationService::new(&provider, fast_options());

    let result = service.translate_batch(&texts(&["一", "二", "三"]), "ja", "en").await;

    assert_eq!(result, texts(&["三", "二", "一"]));
}

/// Test that the payload carries the encoded batch and the language names
#[tokio::test]
async fn test_translate_batch_shouldSendEncodedPayload() {
    let provider = MockProvider::working();
    let service = TranslationService::new(&provider, fast_options());
    let input = texts(&["保存", "キャンセル"]);

    service.translate_batch(&input, "ja", "vi").await;

    let request = provider.last_request().unwrap();
    assert_eq!(request.payload(), codec::encode(&input));
    assert!(request.user_prompt.contains("from Japanese to Vietnamese"));
    assert!(request.system_prompt.contains(SEPARATOR));
}

/// Test that partitioning keeps order and the last batch takes the remainder
#[test]
fn test_partition_withRemainder_shouldKeepOrder() {
    let units: Vec<TextUnit> = (0..7)
        .map(|i| {
            TextUnit::new(
                format!("テキスト{}", i),
                Reference::Cell {
                    sheet: "Sheet1".to_string(),
                    address: format!("A{}", i + 1),
                },
            )
        })
        .collect();

    let batches = batch::partition(units, 3).unwrap();

    let sizes: Vec<usize> = batches.iter().map(|b| b.len()).collect();
    assert_eq!(sizes, vec![3, 3, 1]);
    assert_eq!(batches[2].units[0].location.to_string(), "Sheet1!A7");
}
