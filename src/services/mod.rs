pub mod backend_client;
pub mod employer_chat_service;
pub mod interview_service;
pub mod review_service;
