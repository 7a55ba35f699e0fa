pub mod quiz;

pub use quiz::{
    AnswerDto, StartTestRequest, StartTestResponse, SubmitTestRequest, SubmitTestResponse,
};
