//! Prompt construction for the recommendations and chat paths.

use crate::models::{FarmParameters, Language};

const RECOMMENDATION_PERSONA: &str = "You are an expert agricultural AI assistant named Crop-Sahayaka. \
Your purpose is to provide crop diversification recommendations for farmers in Karnataka, India. \
You must analyze the user's input and return your analysis only in a valid, minified JSON format. \
Do not include any explanatory text, markdown formatting, or anything outside of the JSON object. ";

const CHAT_PERSONA: &str = "You are 'AgriBot', a friendly and knowledgeable AI assistant for Indian farmers, \
specializing in the agriculture of Karnataka. Your expertise includes crop management, soil health, \
pest control, modern farming techniques, and government schemes relevant to Karnataka. \
Provide concise, helpful, and easy-to-understand answers. If a question is outside of this domain, \
politely state that you can only answer agriculture-related questions.";

const RESPONSE_SCHEMA: &str = r#"{
  "metrics": {
    "cropDiversity": "<a number between 1 and 10 representing the number of viable diverse crops>",
    "soilHealth": "<a score out of 10.0 indicating potential soil health improvement>",
    "resilience": "<a score out of 10.0 indicating resilience to climate and market changes>"
  },
  "radarData": [
    {"category": "Sustainability", "value": <percentage between 70 and 95>},
    {"category": "Resilience", "value": <percentage between 70 and 95>},
    {"category": "Profit Stability", "value": <percentage between 65 and 90>},
    {"category": "Soil Health", "value": <percentage between 70 and 95>},
    {"category": "Diversification", "value": <percentage between 70 and 95>}
  ],
  "recommendations": [
    {
      "name": "<crop, vegetable or fruit name>",
      "category": "<one of: field crop, vegetable, fruit>",
      "confidence": <a prediction confidence percentage between 65 and 98>,
      "yield": "<expected yield in t/ha>",
      "profit": "<estimated profit in INR, e.g., '₹8,854'>",
      "benefit": <a diversification benefit score from 60 to 98>
    }
  ]
}"#;

pub fn build_recommendation_prompt(params: &FarmParameters) -> String {
  format!(
    "Based on the following parameters for a farm in Karnataka, India:\n\
     - District: {district}\n\
     - Season: {season}\n\
     - Annual Rainfall: {rainfall} mm\n\
     - Fertilizer Use: {fertilizer} kg/ha\n\
     - Pesticide Use: {pesticide} ltr/ha\n\
     \n\
     Provide a crop diversification plan that mixes field crops, vegetables and fruits. \
     Generate realistic and contextually appropriate data for the specified location.\n\
     Return between 5 and 6 entries in \"recommendations\", ordered from most to least suitable; \
     \"category\" may be omitted when it is unclear.\n\
     The JSON response must strictly adhere to the following structure, with no extra text or explanations:\n\
     {schema}\n",
    district = params.district,
    season = params.season,
    rainfall = params.rainfall,
    fertilizer = params.fertilizer,
    pesticide = params.pesticide,
    schema = RESPONSE_SCHEMA,
  )
}

pub fn recommendation_system_message(language: Language) -> String {
  format!("{RECOMMENDATION_PERSONA}Respond strictly in {}.", language.name())
}

pub fn chat_system_message(language: Language) -> String {
  format!("{CHAT_PERSONA} Reply strictly in {}.", language.name())
}
