/// Classification for cascade policy.
///
/// Used to determine how the resolution engine should respond to errors
/// from sources. A resolution never aborts on a source error; the class only
/// decides whether the failure counts against the source's circuit.
///
/// | Class | Try Next Source? | Record Circuit Breaker Failure? |
/// |-------|------------------|--------------------------------|
/// | `FailoverWithPenalty` | Yes | Yes (affects future requests) |
/// | `NextProvider` | Yes | No |
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RetryClass {
    /// Failover to the next source and record a circuit breaker penalty.
    ///
    /// Used for transport errors, HTTP 429 and timeouts. After enough of
    /// these the circuit opens and the source is skipped for a while.
    FailoverWithPenalty,

    /// Try the next source without recording any penalty.
    ///
    /// The source is reachable but had nothing usable for this instrument.
    NextProvider,
}
