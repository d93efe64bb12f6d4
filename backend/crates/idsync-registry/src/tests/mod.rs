mod error_response;
