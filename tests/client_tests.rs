use async_trait::async_trait;
use barrister::idl::parse;
use barrister::rpc::{error_codes, Client, Dispatcher, Handler, LocalTransport, RpcError};
use barrister::BarristerError;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

const CALC_IDL: &str = r#"
struct Sum {
    total int
    terms int
}

interface Calc {
    add(a int, b int) int
    sum(values []int) Sum
    divide(a float, b float) float
    record(note string) bool
    wrong() int
}
"#;

struct CalcHandler {
    notes: Arc<AtomicUsize>,
}

#[async_trait]
impl Handler for CalcHandler {
    async fn call(&self, method: &str, params: Vec<Value>) -> Result<Value, RpcError> {
        match method {
            "add" => {
                let a = params[0].as_i64().unwrap_or_default();
                let b = params[1].as_i64().unwrap_or_default();
                Ok(json!(a + b))
            }
            "sum" => {
                let values = params[0].as_array().cloned().unwrap_or_default();
                let total: i64 = values.iter().filter_map(Value::as_i64).sum();
                Ok(json!({"total": total, "terms": values.len()}))
            }
            "divide" => {
                let b = params[1].as_f64().unwrap_or_default();
                if b == 0.0 {
                    return Err(RpcError::application(1000, "division by zero"));
                }
                Ok(json!(params[0].as_f64().unwrap_or_default() / b))
            }
            "record" => {
                self.notes.fetch_add(1, Ordering::SeqCst);
                Ok(json!(true))
            }
            "wrong" => Ok(json!("seven")),
            other => Err(RpcError::method_not_found(other)),
        }
    }
}

fn dispatcher(notes: Arc<AtomicUsize>) -> Arc<Dispatcher> {
    let mut dispatcher = Dispatcher::new(parse(CALC_IDL).unwrap()).unwrap();
    dispatcher.register("Calc", CalcHandler { notes }).unwrap();
    Arc::new(dispatcher)
}

fn unchecked_client() -> Client {
    Client::new(LocalTransport::new(dispatcher(Arc::new(AtomicUsize::new(0)))))
}

fn checked_client() -> Client {
    let transport = LocalTransport::new(dispatcher(Arc::new(AtomicUsize::new(0))));
    Client::with_idl(transport, &parse(CALC_IDL).unwrap()).unwrap()
}

#[tokio::test]
async fn call_returns_result() {
    let client = unchecked_client();
    let result = client.call("Calc.add", vec![json!(2), json!(3)]).await.unwrap();
    assert_eq!(result, json!(5));
}

#[tokio::test]
async fn server_errors_surface_as_rpc_errors() {
    let client = unchecked_client();
    let err = client.call("Calc.add", vec![json!("two"), json!(3)]).await.unwrap_err();
    match err {
        BarristerError::Rpc(rpc) => assert_eq!(rpc.code, error_codes::INVALID_PARAMS),
        other => panic!("unexpected error {:?}", other),
    }
}

#[tokio::test]
async fn application_error_reaches_caller() {
    let client = unchecked_client();
    let err = client.call("Calc.divide", vec![json!(1.0), json!(0.0)]).await.unwrap_err();
    match err {
        BarristerError::Rpc(rpc) => {
            assert_eq!(rpc.code, 1000);
            assert!(rpc.is_application());
            assert_eq!(rpc.message, "division by zero");
        }
        other => panic!("unexpected error {:?}", other),
    }
}

#[tokio::test]
async fn checked_client_rejects_bad_params_before_sending() {
    let client = checked_client();
    let err = client.call("Calc.sum", vec![json!([1, "2"])]).await.unwrap_err();
    match err {
        BarristerError::Rpc(rpc) => {
            assert_eq!(rpc.code, error_codes::INVALID_PARAMS);
            assert_eq!(
                rpc.detail(),
                Some("Parameter 0 (values) validation failed: values[1]: expected int, got string")
            );
        }
        other => panic!("unexpected error {:?}", other),
    }

    let err = client.call("Calc.missing", vec![]).await.unwrap_err();
    assert!(matches!(err, BarristerError::Rpc(rpc) if rpc.code == error_codes::METHOD_NOT_FOUND));
}

#[tokio::test]
async fn checked_client_accepts_valid_struct_result() {
    let client = checked_client();
    let result = client.call("Calc.sum", vec![json!([1, 2, 3])]).await.unwrap();
    assert_eq!(result, json!({"total": 6, "terms": 3}));
}

#[tokio::test]
async fn notify_executes_without_response() {
    let notes = Arc::new(AtomicUsize::new(0));
    let client = Client::new(LocalTransport::new(dispatcher(notes.clone())));
    client.notify("Calc.record", vec![json!("hello")]).await.unwrap();
    assert_eq!(notes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn batch_results_follow_call_order() {
    let client = unchecked_client();
    let results = client
        .batch(vec![
            ("Calc.add".to_string(), vec![json!(1), json!(1)]),
            ("Calc.divide".to_string(), vec![json!(1.0), json!(0.0)]),
            ("Calc.add".to_string(), vec![json!(10), json!(5)]),
        ])
        .await
        .unwrap();
    assert_eq!(results.len(), 3);
    assert_eq!(results[0].as_ref().unwrap(), &json!(2));
    assert_eq!(results[1].as_ref().unwrap_err().code, 1000);
    assert_eq!(results[2].as_ref().unwrap(), &json!(15));
}

#[tokio::test]
async fn empty_batch_sends_nothing() {
    let client = unchecked_client();
    assert!(client.batch(Vec::new()).await.unwrap().is_empty());
}

#[tokio::test]
async fn fetch_idl_round_trips() {
    let client = unchecked_client();
    let idl = client.fetch_idl().await.unwrap();
    // positions are not part of the JSON form
    assert_eq!(idl.to_value().unwrap(), parse(CALC_IDL).unwrap().to_value().unwrap());
    assert_eq!(idl.interfaces[0].methods.len(), 5);
}

#[tokio::test]
async fn server_side_result_validation_is_reported() {
    let client = unchecked_client();
    let err = client.call("Calc.wrong", vec![]).await.unwrap_err();
    assert!(matches!(err, BarristerError::Rpc(rpc) if rpc.code == error_codes::INTERNAL_ERROR));
}

#[test]
fn with_idl_rejects_invalid_idl() {
    let transport = LocalTransport::new(dispatcher(Arc::new(AtomicUsize::new(0))));
    let result = Client::with_idl(transport, &parse("struct A { b Missing }").unwrap());
    assert!(matches!(result, Err(BarristerError::Validation(_))));
}
