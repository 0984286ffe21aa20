// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Loads the failure code table from JSON configuration and shows how coded
//! failures are translated while uncoded ones keep their own message.

use tripwire::{Descriptor, ErrorHandler, FaultCodes, FaultCodesError, HttpFailure};

const CODES: &str = r#"{
    "401": "Please sign in again.",
    "404": "The requested data or service could not be found.",
    "409": "Someone else changed this record. Reload and try again.",
    "500": "Unknown errors occurred at the server."
}"#;

fn main() -> Result<(), FaultCodesError> {
    let handler = ErrorHandler::new(FaultCodes::from_json(CODES)?);
    let save = Descriptor::new("save_record").describe("save the record");

    for status in [409, 401, 418] {
        let _ = handler.run(&save, || Err::<(), _>(HttpFailure::new(status).with_message("raw server text")));
    }

    for entry in handler.errors().iter() {
        println!("{entry}");
    }

    Ok(())
}
